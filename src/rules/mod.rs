//! Rules that turn raw wall-clock time into counted time.
//!
//! A [`RulePipeline`] folds a running duration through the rules in the
//! order the caller supplied them. Each rule sees the previous rule's output
//! plus the original [`HistoryEntry`] for size and status context.
//!
//! Status filters are conventionally listed first. The pipeline stops as soon
//! as a filter excludes an entry, so an excluded entry counts zero no matter
//! where the filter sits. Multiplier rules commute, so a pipeline built only
//! from filters and multipliers yields the same counted time in any order.
//!
//! [`Rule::CarryForward`] does not transform durations; the credit ledger
//! consults it to decide whether balances roll between sub-periods.

mod filter;
mod multiplier;
pub mod presets;

pub use filter::IgnoreStatus;
pub use multiplier::{BurnRate, MultiplySize};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, MAX_SCALE, SECONDS_SCALE};
use crate::{Error, Result};

/// Marks that unused (or overdrawn) balance rolls into the next sub-period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryForward {
    pub name: String,
}

impl CarryForward {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for CarryForward {
    fn default() -> Self {
        Self::new("Carry forward unused time")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    IgnoreStatus(IgnoreStatus),
    MultiplySize(MultiplySize),
    BurnRate(BurnRate),
    CarryForward(CarryForward),
}

impl Rule {
    pub fn name(&self) -> &str {
        match self {
            Self::IgnoreStatus(rule) => &rule.name,
            Self::MultiplySize(rule) => &rule.name,
            Self::BurnRate(rule) => &rule.name,
            Self::CarryForward(rule) => &rule.name,
        }
    }

    /// Whether this rule has any effect on `entry`.
    pub fn applies(&self, entry: &HistoryEntry) -> bool {
        match self {
            Self::IgnoreStatus(rule) => rule.excludes(entry),
            Self::MultiplySize(_) => true,
            Self::BurnRate(rule) => rule.covers(entry),
            Self::CarryForward(_) => false,
        }
    }

    /// Adjusts the running counted time for `entry`.
    pub fn apply(&self, counted: Decimal, entry: &HistoryEntry) -> Result<Decimal> {
        if !self.applies(entry) {
            return Ok(counted);
        }
        match self {
            Self::IgnoreStatus(_) => Ok(Decimal::ZERO),
            Self::MultiplySize(rule) => rule.scale(counted, entry),
            Self::BurnRate(rule) => rule.scale(counted),
            Self::CarryForward(_) => Ok(counted),
        }
    }

    /// Most decimal places this rule adds to counted time.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Self::MultiplySize(rule) => rule.decimal_places(),
            Self::BurnRate(rule) => rule.decimal_places(),
            Self::IgnoreStatus(_) | Self::CarryForward(_) => 0,
        }
    }

    pub fn is_filter(&self) -> bool {
        matches!(self, Self::IgnoreStatus(_))
    }

    pub fn is_carry_forward(&self) -> bool {
        matches!(self, Self::CarryForward(_))
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::IgnoreStatus(rule) => rule.validate(),
            Self::MultiplySize(rule) => rule.validate(),
            Self::BurnRate(rule) => rule.validate(),
            Self::CarryForward(_) => Ok(()),
        }
    }
}

impl From<IgnoreStatus> for Rule {
    fn from(rule: IgnoreStatus) -> Self {
        Self::IgnoreStatus(rule)
    }
}

impl From<MultiplySize> for Rule {
    fn from(rule: MultiplySize) -> Self {
        Self::MultiplySize(rule)
    }
}

impl From<BurnRate> for Rule {
    fn from(rule: BurnRate) -> Self {
        Self::BurnRate(rule)
    }
}

impl From<CarryForward> for Rule {
    fn from(rule: CarryForward) -> Self {
        Self::CarryForward(rule)
    }
}

/// Ordered view over a caller-supplied rule list.
#[derive(Debug, Clone, Copy)]
pub struct RulePipeline<'a> {
    rules: &'a [Rule],
}

impl<'a> RulePipeline<'a> {
    pub fn new(rules: &'a [Rule]) -> Self {
        Self { rules }
    }

    /// Validates every rule, failing on the first bad one.
    ///
    /// Multipliers together may not need more decimal places than counted
    /// time can carry on top of nanosecond seconds. Within that budget every
    /// product is exact, so splitting a window never changes its totals.
    pub fn validate(&self) -> Result<()> {
        let mut places = SECONDS_SCALE;
        for rule in self.rules {
            rule.validate()?;
            places += rule.decimal_places();
            if places > MAX_SCALE {
                return Err(Error::InvalidRule {
                    rule: rule.name().to_string(),
                    message: format!(
                        "rules need {places} decimal places, more than the {MAX_SCALE} counted time holds exactly"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Counted seconds for `raw` seconds of `entry`.
    pub fn counted(&self, raw: Decimal, entry: &HistoryEntry) -> Result<Decimal> {
        let mut counted = raw;
        for rule in self.rules {
            if rule.is_filter() && rule.applies(entry) {
                return Ok(Decimal::ZERO);
            }
            counted = rule.apply(counted, entry)?;
        }
        Ok(counted)
    }

    pub fn carries_forward(&self) -> bool {
        self.rules.iter().any(Rule::is_carry_forward)
    }

    pub fn rules(&self) -> &'a [Rule] {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
