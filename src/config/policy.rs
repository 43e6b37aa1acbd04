//! Allocation policy assembled from configuration sources.
//!
//! A policy is the caller-side bundle of rules, subdivision and credits. The
//! engine never reads configuration itself; [`AllocationPolicy::request`]
//! turns a loaded policy into an explicit [`AllocationRequest`].

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use super::provider::{PolicySource, PolicySourceExt};
use crate::Result;
use crate::credit::{CreditGrant, CreditRecharge, TimeUnit};
use crate::engine::AllocationRequest;
use crate::model::{Instance, SizeAttribute, Status};
use crate::rules::{BurnRate, CarryForward, IgnoreStatus, MultiplySize, Rule, presets};
use crate::window::{AccountingWindow, CalendarStep, CalendarUnit, Interval, Subdivision};

pub mod keys {
    pub const RULES: &str = "rules";
    pub const SUBDIVISION: &str = "subdivision";
    pub const CREDITS: &str = "credits";
    pub const RECHARGES: &str = "recharges";
}

/// Rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum RuleConfig {
    MultiplySize {
        name: Option<String>,
        attribute: SizeAttribute,
        multiplier: Decimal,
    },
    BurnRate {
        name: Option<String>,
        multiplier: Decimal,
        statuses: Option<Vec<String>>,
    },
    IgnoreStatus {
        name: Option<String>,
        statuses: Vec<String>,
    },
    CarryForward {
        name: Option<String>,
    },
    /// One of the named rules in [`presets`].
    Preset {
        preset: String,
    },
}

impl RuleConfig {
    pub fn into_rule(self) -> Result<Rule> {
        let rule: Rule = match self {
            Self::MultiplySize {
                name,
                attribute,
                multiplier,
            } => {
                let name = name.unwrap_or_else(|| format!("Multiply TimeUsed by {attribute}"));
                MultiplySize::new(name, attribute, multiplier).into()
            }
            Self::BurnRate {
                name,
                multiplier,
                statuses,
            } => {
                let name = name.unwrap_or_else(|| format!("Burn rate x{multiplier}"));
                let mut rate = BurnRate::new(name, multiplier);
                if let Some(statuses) = statuses {
                    let parsed = statuses
                        .iter()
                        .map(|s| s.parse::<Status>())
                        .collect::<Result<Vec<_>>>()?;
                    rate = rate.for_statuses(parsed);
                }
                rate.into()
            }
            Self::IgnoreStatus { name, statuses } => {
                let name = name.unwrap_or_else(|| format!("Ignore {}", statuses.join(", ")));
                IgnoreStatus::parse(name, &statuses)?.into()
            }
            Self::CarryForward { name } => match name {
                Some(name) => CarryForward::new(name).into(),
                None => CarryForward::default().into(),
            },
            Self::Preset { preset } => preset_rule(&preset)?,
        };
        rule.validate()?;
        Ok(rule)
    }
}

fn preset_rule(preset: &str) -> Result<Rule> {
    let rule = match preset {
        "multiply_by_cpu" => presets::multiply_by_cpu(),
        "multiply_by_ram" => presets::multiply_by_ram(),
        "multiply_by_disk" => presets::multiply_by_disk(),
        "half_usage_by_cpu" => presets::half_usage_by_cpu(),
        "half_usage_by_ram" => presets::half_usage_by_ram(),
        "half_usage_by_disk" => presets::half_usage_by_disk(),
        "zero_burn_rate" => presets::zero_burn_rate(),
        "half_burn_rate" => presets::half_burn_rate(),
        "double_burn_rate" => presets::double_burn_rate(),
        "ignore_suspended" => presets::ignore_suspended(),
        "ignore_build" => presets::ignore_build(),
        "ignore_inactive" => presets::ignore_inactive(),
        "carry_forward" => presets::carry_forward(),
        other => {
            return Err(ConfigError::InvalidValue {
                key: keys::RULES.to_string(),
                message: format!("unknown rule preset '{other}'"),
            }
            .into());
        }
    };
    Ok(rule)
}

/// Subdivision (or recharge interval) as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case", deny_unknown_fields)]
pub enum SubdivisionConfig {
    Cumulative,
    Fixed {
        #[serde(default)]
        days: i64,
        #[serde(default)]
        hours: i64,
        #[serde(default)]
        seconds: i64,
    },
    Calendar {
        unit: CalendarUnit,
        #[serde(default = "default_count")]
        count: u32,
    },
}

fn default_count() -> u32 {
    1
}

impl SubdivisionConfig {
    fn fixed_duration(key: &str, days: i64, hours: i64, seconds: i64) -> Result<TimeDelta> {
        let total = TimeDelta::try_days(days)
            .zip(TimeDelta::try_hours(hours))
            .zip(TimeDelta::try_seconds(seconds))
            .and_then(|((d, h), s)| d.checked_add(&h)?.checked_add(&s));
        total.ok_or_else(|| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: "fixed duration is out of range".into(),
            }
            .into()
        })
    }

    pub fn into_subdivision(self) -> Result<Subdivision> {
        let subdivision = match self {
            Self::Cumulative => Subdivision::Cumulative,
            Self::Fixed {
                days,
                hours,
                seconds,
            } => Subdivision::fixed(Self::fixed_duration(
                keys::SUBDIVISION,
                days,
                hours,
                seconds,
            )?),
            Self::Calendar { unit, count } => Subdivision::calendar(unit, count),
        };
        subdivision.strategy().validate()?;
        Ok(subdivision)
    }

    pub fn into_interval(self) -> Result<Interval> {
        let interval = match self {
            Self::Cumulative => {
                return Err(ConfigError::InvalidValue {
                    key: keys::RECHARGES.to_string(),
                    message: "a recharge needs a fixed or calendar interval".into(),
                }
                .into());
            }
            Self::Fixed {
                days,
                hours,
                seconds,
            } => Interval::Fixed(Self::fixed_duration(keys::RECHARGES, days, hours, seconds)?),
            Self::Calendar { unit, count } => Interval::Calendar(CalendarStep::new(unit, count)),
        };
        interval.validate()?;
        Ok(interval)
    }
}

/// Recurring grant as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeConfig {
    pub name: String,
    pub unit: TimeUnit,
    pub amount: Decimal,
    pub first_at: DateTime<Utc>,
    pub every: SubdivisionConfig,
}

impl RechargeConfig {
    pub fn into_recharge(self) -> Result<CreditRecharge> {
        let every = self.every.into_interval()?;
        Ok(CreditRecharge::new(
            self.name,
            self.unit,
            self.amount,
            self.first_at,
            every,
        ))
    }
}

/// Rules, subdivision and credits for a family of calculations.
#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    pub rules: Vec<Rule>,
    pub subdivision: Subdivision,
    pub credits: Vec<CreditGrant>,
    pub recharges: Vec<CreditRecharge>,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            rules: presets::default_rules(),
            subdivision: Subdivision::Cumulative,
            credits: Vec::new(),
            recharges: Vec::new(),
        }
    }
}

impl AllocationPolicy {
    /// Loads a policy, falling back to defaults for absent keys.
    pub async fn load<S: PolicySource + ?Sized>(source: &S) -> Result<Self> {
        let mut policy = Self::default();

        if let Some(rules) = source.get::<Vec<RuleConfig>>(keys::RULES).await? {
            policy.rules = rules
                .into_iter()
                .map(RuleConfig::into_rule)
                .collect::<Result<_>>()?;
        }
        if let Some(subdivision) = source
            .get::<SubdivisionConfig>(keys::SUBDIVISION)
            .await?
        {
            policy.subdivision = subdivision.into_subdivision()?;
        }
        if let Some(credits) = source.get::<Vec<CreditGrant>>(keys::CREDITS).await? {
            credits.iter().try_for_each(CreditGrant::validate)?;
            policy.credits = credits;
        }
        if let Some(recharges) = source.get::<Vec<RechargeConfig>>(keys::RECHARGES).await? {
            policy.recharges = recharges
                .into_iter()
                .map(RechargeConfig::into_recharge)
                .collect::<Result<_>>()?;
        }

        tracing::debug!(
            source = source.name(),
            rules = policy.rules.len(),
            credits = policy.credits.len(),
            recharges = policy.recharges.len(),
            strategy = policy.subdivision.strategy().name(),
            "Loaded allocation policy"
        );
        Ok(policy)
    }

    /// Explicit request for `[start, end)` over `instances`, with recharges
    /// expanded through `end`.
    pub fn request(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        instances: impl IntoIterator<Item = Instance>,
    ) -> Result<AllocationRequest> {
        let window = AccountingWindow::new(start, end).subdivided(self.subdivision);
        self.recharges
            .iter()
            .cloned()
            .fold(AllocationRequest::builder(window), |builder, recharge| {
                builder.recharge(recharge)
            })
            .rules(self.rules.iter().cloned())
            .credits(self.credits.iter().cloned())
            .instances(instances)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::config::MemorySource;
    use crate::rules::RulePipeline;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn date(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, month, day, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_source_uses_defaults() {
        let policy = AllocationPolicy::load(&MemorySource::new()).await.unwrap();
        assert_eq!(policy.rules, presets::default_rules());
        assert_eq!(policy.subdivision, Subdivision::Cumulative);
        assert!(policy.credits.is_empty());
    }

    #[tokio::test]
    async fn test_full_policy() {
        let source = MemorySource::new()
            .json(
                keys::RULES,
                &json!([
                    { "type": "ignore_status", "statuses": ["suspended", "build"] },
                    { "type": "multiply_size", "attribute": "ram", "multiplier": "0.5" },
                    { "type": "burn_rate", "multiplier": 2, "statuses": ["paused"] },
                    { "type": "preset", "preset": "carry_forward" }
                ]),
            )
            .json(keys::SUBDIVISION, &json!({ "strategy": "fixed", "days": 21 }))
            .json(
                keys::CREDITS,
                &json!([{
                    "name": "Add 10,000 Hours",
                    "unit": "hour",
                    "amount": "10000",
                    "effective_at": "2014-07-01T00:00:00Z"
                }]),
            )
            .json(
                keys::RECHARGES,
                &json!([{
                    "name": "Monthly top-up",
                    "unit": "hour",
                    "amount": "100",
                    "first_at": "2014-07-01T00:00:00Z",
                    "every": { "strategy": "calendar", "unit": "month" }
                }]),
            );

        let policy = AllocationPolicy::load(&source).await.unwrap();
        assert_eq!(policy.rules.len(), 4);
        assert!(RulePipeline::new(&policy.rules).carries_forward());
        assert_eq!(policy.subdivision, Subdivision::fixed(TimeDelta::days(21)));
        assert_eq!(policy.credits[0].amount, dec!(10000));

        let Rule::BurnRate(rate) = &policy.rules[2] else {
            panic!("Expected burn rate");
        };
        assert!(rate.statuses.as_ref().unwrap().contains(&Status::Paused));

        let request = policy.request(date(7, 1), date(12, 1), Vec::new()).unwrap();
        assert_eq!(request.credits.len(), 6);
        assert_eq!(request.window.subdivision, policy.subdivision);
    }

    #[tokio::test]
    async fn test_unknown_rule_type_rejected() {
        let source =
            MemorySource::new().json(keys::RULES, &json!([{ "type": "round_up_to_hour" }]));
        let err = AllocationPolicy::load(&source).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
        assert!(err.is_configuration_error());
    }

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let source = MemorySource::new().json(
            keys::RULES,
            &json!([{ "type": "ignore_status", "statuses": ["hibernating"] }]),
        );
        let err = AllocationPolicy::load(&source).await.unwrap_err();
        assert!(matches!(err, Error::UnknownStatus(ref s) if s == "hibernating"));
    }

    #[tokio::test]
    async fn test_unknown_preset_rejected() {
        let source =
            MemorySource::new().json(keys::RULES, &json!([{ "type": "preset", "preset": "free" }]));
        assert!(AllocationPolicy::load(&source).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_subdivision_rejected() {
        let source = MemorySource::new().json(
            keys::SUBDIVISION,
            &json!({ "strategy": "calendar", "unit": "month", "count": 0 }),
        );
        let err = AllocationPolicy::load(&source).await.unwrap_err();
        assert!(matches!(err, Error::InvalidSubdivision(_)));

        let source =
            MemorySource::new().json(keys::SUBDIVISION, &json!({ "strategy": "fixed" }));
        assert!(AllocationPolicy::load(&source).await.is_err());
    }

    #[tokio::test]
    async fn test_cumulative_recharge_rejected() {
        let source = MemorySource::new().json(
            keys::RECHARGES,
            &json!([{
                "name": "Never",
                "unit": "hour",
                "amount": "1",
                "first_at": "2014-07-01T00:00:00Z",
                "every": { "strategy": "cumulative" }
            }]),
        );
        let err = AllocationPolicy::load(&source).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_generated_rule_names() {
        let rule = RuleConfig::MultiplySize {
            name: None,
            attribute: SizeAttribute::Cpu,
            multiplier: dec!(1),
        }
        .into_rule()
        .unwrap();
        assert_eq!(rule.name(), "Multiply TimeUsed by cpu");
    }
}
