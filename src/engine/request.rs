//! Calculation input and the builder that validates it and expands recharges.

use crate::Result;
use crate::credit::{CreditGrant, CreditRecharge};
use crate::model::Instance;
use crate::rules::{Rule, RulePipeline};
use crate::window::AccountingWindow;

/// Everything one calculation needs, supplied fully materialised by the caller.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub credits: Vec<CreditGrant>,
    pub rules: Vec<Rule>,
    pub instances: Vec<Instance>,
    pub window: AccountingWindow,
}

impl AllocationRequest {
    pub fn new(window: AccountingWindow) -> Self {
        Self {
            credits: Vec::new(),
            rules: Vec::new(),
            instances: Vec::new(),
            window,
        }
    }

    pub fn builder(window: AccountingWindow) -> AllocationRequestBuilder {
        AllocationRequestBuilder {
            request: Self::new(window),
            recharges: Vec::new(),
        }
    }

    /// Pre-pass over every input. Configuration problems are reported before
    /// data problems.
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        RulePipeline::new(&self.rules).validate()?;
        self.credits.iter().try_for_each(CreditGrant::validate)?;
        self.instances.iter().try_for_each(Instance::validate)
    }
}

#[derive(Debug, Clone)]
pub struct AllocationRequestBuilder {
    request: AllocationRequest,
    recharges: Vec<CreditRecharge>,
}

impl AllocationRequestBuilder {
    pub fn credit(mut self, grant: CreditGrant) -> Self {
        self.request.credits.push(grant);
        self
    }

    pub fn credits(mut self, grants: impl IntoIterator<Item = CreditGrant>) -> Self {
        self.request.credits.extend(grants);
        self
    }

    /// Adds a recurring grant, expanded over the window on [`build`](Self::build).
    pub fn recharge(mut self, recharge: CreditRecharge) -> Self {
        self.recharges.push(recharge);
        self
    }

    pub fn rule(mut self, rule: impl Into<Rule>) -> Self {
        self.request.rules.push(rule.into());
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.request.rules.extend(rules);
        self
    }

    pub fn instance(mut self, instance: Instance) -> Self {
        self.request.instances.push(instance);
        self
    }

    pub fn instances(mut self, instances: impl IntoIterator<Item = Instance>) -> Self {
        self.request.instances.extend(instances);
        self
    }

    /// Expands recharges through the window end and validates the request.
    pub fn build(mut self) -> Result<AllocationRequest> {
        for recharge in &self.recharges {
            let grants = recharge.expand(self.request.window.end)?;
            self.request.credits.extend(grants);
        }
        self.request.validate()?;
        Ok(self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::credit::TimeUnit;
    use crate::model::{Machine, Provider, Size, Status};
    use crate::rules::presets;
    use crate::window::{CalendarStep, CalendarUnit, Interval};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn date(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, month, day, 0, 0, 0).unwrap()
    }

    fn window() -> AccountingWindow {
        AccountingWindow::new(date(7, 1), date(12, 1))
    }

    #[test]
    fn test_builder_expands_recharges() {
        let request = AllocationRequest::builder(window())
            .recharge(CreditRecharge::new(
                "Monthly",
                TimeUnit::Hour,
                dec!(100),
                date(7, 1),
                Interval::Calendar(CalendarStep::new(CalendarUnit::Month, 1)),
            ))
            .credit(CreditGrant::hours("Bonus", dec!(5), date(9, 3)))
            .rules(presets::default_rules())
            .build()
            .unwrap();

        assert_eq!(request.credits.len(), 6);
        assert_eq!(request.rules.len(), 4);
    }

    #[test]
    fn test_configuration_errors_reported_before_data_errors() {
        let empty = Instance {
            identifier: "no-history".into(),
            provider: Provider::new("p", "1"),
            machine: Machine::new("m", "1"),
            history: Vec::new(),
        };
        let err = AllocationRequest::builder(AccountingWindow::new(date(9, 1), date(7, 1)))
            .instance(empty.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWindow { .. }));

        let err = AllocationRequest::builder(window())
            .instance(empty)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::EmptyHistory { .. }));
    }

    #[test]
    fn test_validate_rejects_negative_credit() {
        let size = Arc::new(Size::new("tiny", "test.tiny", 1, 2048, 0));
        let instance = Instance::builder("i", Provider::new("p", "1"), Machine::new("m", "1"))
            .status(Status::Active, &size, date(7, 1), date(7, 2))
            .build()
            .unwrap();
        let err = AllocationRequest::builder(window())
            .credit(CreditGrant::hours("Negative", dec!(-1), date(7, 1)))
            .instance(instance)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredit { .. }));
    }
}
