//! Ready-made rules for assembling policies.
//!
//! The engine never applies these on its own; callers (or the policy
//! configuration layer) pick them explicitly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{BurnRate, CarryForward, IgnoreStatus, MultiplySize, Rule};
use crate::model::{SizeAttribute, Status};

pub fn multiply_by_cpu() -> Rule {
    MultiplySize::new("Multiply TimeUsed by CPU", SizeAttribute::Cpu, Decimal::ONE).into()
}

pub fn multiply_by_ram() -> Rule {
    MultiplySize::new("Multiply TimeUsed by RAM (GB)", SizeAttribute::Ram, Decimal::ONE).into()
}

pub fn multiply_by_disk() -> Rule {
    MultiplySize::new("Multiply TimeUsed by Disk (GB)", SizeAttribute::Disk, Decimal::ONE).into()
}

pub fn half_usage_by_cpu() -> Rule {
    MultiplySize::new("Multiply TimeUsed by 50% of CPU", SizeAttribute::Cpu, dec!(0.5)).into()
}

pub fn half_usage_by_ram() -> Rule {
    MultiplySize::new("Multiply TimeUsed by 50% of RAM (GB)", SizeAttribute::Ram, dec!(0.5)).into()
}

pub fn half_usage_by_disk() -> Rule {
    MultiplySize::new("Multiply TimeUsed by 50% of Disk", SizeAttribute::Disk, dec!(0.5)).into()
}

pub fn zero_burn_rate() -> Rule {
    BurnRate::new("Stop all Total Time Used", Decimal::ZERO).into()
}

pub fn half_burn_rate() -> Rule {
    BurnRate::new("Half-Off Total Time Used", dec!(0.5)).into()
}

pub fn double_burn_rate() -> Rule {
    BurnRate::new("Double Total Time Used", dec!(2)).into()
}

pub fn ignore_suspended() -> Rule {
    IgnoreStatus::new("Ignore Suspended Instances", [Status::Suspended]).into()
}

pub fn ignore_build() -> Rule {
    IgnoreStatus::new("Ignore 'Build' Instances", [Status::Build]).into()
}

/// Ignores every status other than `active`.
pub fn ignore_inactive() -> Rule {
    IgnoreStatus::new(
        "Ignore Inactive Instances",
        Status::ALL.into_iter().filter(|s| !s.is_active()),
    )
    .into()
}

pub fn carry_forward() -> Rule {
    CarryForward::default().into()
}

/// CPU-weighted time, suspended and build time ignored, balance carried forward.
pub fn default_rules() -> Vec<Rule> {
    vec![
        multiply_by_cpu(),
        ignore_suspended(),
        ignore_build(),
        carry_forward(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RulePipeline;

    #[test]
    fn test_presets_are_valid() {
        let all = [
            multiply_by_cpu(),
            multiply_by_ram(),
            multiply_by_disk(),
            half_usage_by_cpu(),
            half_usage_by_ram(),
            half_usage_by_disk(),
            zero_burn_rate(),
            half_burn_rate(),
            double_burn_rate(),
            ignore_suspended(),
            ignore_build(),
            ignore_inactive(),
            carry_forward(),
        ];
        assert!(RulePipeline::new(&all).validate().is_ok());
    }

    #[test]
    fn test_ignore_inactive_keeps_active() {
        let Rule::IgnoreStatus(rule) = ignore_inactive() else {
            panic!("Expected status filter");
        };
        assert!(!rule.statuses.contains(&Status::Active));
        assert_eq!(rule.statuses.len(), Status::ALL.len() - 1);
    }

    #[test]
    fn test_default_rules_carry_forward() {
        let rules = default_rules();
        assert!(RulePipeline::new(&rules).carries_forward());
        assert_eq!(rules.len(), 4);
    }
}
