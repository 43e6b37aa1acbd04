//! Size-weighted and flat multipliers applied to counted time.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, MAX_SCALE, SECONDS_SCALE, SizeAttribute, Status, exact_mul};
use crate::{Error, Result};

fn check_multiplier(name: &str, multiplier: Decimal, places: u32) -> Result<()> {
    if multiplier < Decimal::ZERO {
        return Err(Error::InvalidRule {
            rule: name.to_string(),
            message: format!("multiplier must not be negative (got {multiplier})"),
        });
    }
    if SECONDS_SCALE + places > MAX_SCALE {
        return Err(Error::InvalidRule {
            rule: name.to_string(),
            message: format!(
                "multiplier {multiplier} needs {places} decimal places, at most {} keep counted time exact",
                MAX_SCALE - SECONDS_SCALE
            ),
        });
    }
    Ok(())
}

fn multiply(name: &str, counted: Decimal, factor: Decimal) -> Result<Decimal> {
    exact_mul(counted, factor).ok_or_else(|| Error::overflow(format!("rule '{name}'")))
}

/// Scales counted time by `multiplier` per unit of one size attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplySize {
    pub name: String,
    pub attribute: SizeAttribute,
    pub multiplier: Decimal,
}

impl MultiplySize {
    pub fn new(name: impl Into<String>, attribute: SizeAttribute, multiplier: Decimal) -> Self {
        Self {
            name: name.into(),
            attribute,
            multiplier,
        }
    }

    pub fn scale(&self, counted: Decimal, entry: &HistoryEntry) -> Result<Decimal> {
        let scaled = multiply(&self.name, counted, self.multiplier)?;
        multiply(&self.name, scaled, entry.size.attribute(self.attribute))
    }

    /// Most decimal places this rule adds to the quantity it scales.
    pub fn decimal_places(&self) -> u32 {
        self.multiplier.normalize().scale() + self.attribute.decimal_places()
    }

    pub(super) fn validate(&self) -> Result<()> {
        check_multiplier(&self.name, self.multiplier, self.decimal_places())
    }
}

/// Flat, size-independent multiplier.
///
/// With no status scope every entry is scaled; otherwise only entries whose
/// status is in `statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRate {
    pub name: String,
    pub multiplier: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses: Option<BTreeSet<Status>>,
}

impl BurnRate {
    pub fn new(name: impl Into<String>, multiplier: Decimal) -> Self {
        Self {
            name: name.into(),
            multiplier,
            statuses: None,
        }
    }

    pub fn for_statuses(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn covers(&self, entry: &HistoryEntry) -> bool {
        self.statuses
            .as_ref()
            .is_none_or(|statuses| statuses.contains(&entry.status))
    }

    pub fn scale(&self, counted: Decimal) -> Result<Decimal> {
        multiply(&self.name, counted, self.multiplier)
    }

    pub fn decimal_places(&self) -> u32 {
        self.multiplier.normalize().scale()
    }

    pub(super) fn validate(&self) -> Result<()> {
        check_multiplier(&self.name, self.multiplier, self.decimal_places())?;
        if self.statuses.as_ref().is_some_and(BTreeSet::is_empty) {
            return Err(Error::InvalidRule {
                rule: self.name.clone(),
                message: "burn rate scope has no statuses".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Size;
    use chrono::{TimeDelta, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn entry(status: Status) -> HistoryEntry {
        let size = Arc::new(Size::new("Small Fry", "test.small", 2, 4096, 60));
        let start = Utc.with_ymd_and_hms(2014, 7, 1, 0, 0, 0).unwrap();
        HistoryEntry::new(status, size, start, start + TimeDelta::hours(1))
    }

    #[test]
    fn test_multiply_by_each_attribute() {
        let e = entry(Status::Active);
        let cpu = MultiplySize::new("cpu", SizeAttribute::Cpu, dec!(1));
        let ram = MultiplySize::new("ram", SizeAttribute::Ram, dec!(1));
        let disk = MultiplySize::new("disk", SizeAttribute::Disk, dec!(0.5));
        assert_eq!(cpu.scale(dec!(3600), &e).unwrap(), dec!(7200));
        assert_eq!(ram.scale(dec!(3600), &e).unwrap(), dec!(14400));
        assert_eq!(disk.scale(dec!(3600), &e).unwrap(), dec!(108000));
    }

    #[test]
    fn test_multiplier_linearity() {
        let e = entry(Status::Active);
        let single = MultiplySize::new("x1", SizeAttribute::Cpu, dec!(1.5));
        let double = MultiplySize::new("x2", SizeAttribute::Cpu, dec!(3));
        assert_eq!(
            double.scale(dec!(977), &e).unwrap(),
            single.scale(dec!(977), &e).unwrap() * dec!(2)
        );
    }

    #[test]
    fn test_repeating_fraction_multiplier_invalid() {
        let third = dec!(0.3333333333333333333333333333);
        let err = MultiplySize::new("Third", SizeAttribute::Cpu, third)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRule { ref rule, .. } if rule == "Third"));
        assert!(BurnRate::new("Third", third).validate().is_err());
    }

    #[test]
    fn test_decimal_places_budget() {
        // 19 places fit with nanosecond seconds; ram adds ten more.
        let nineteen = dec!(0.0000000000000000001);
        assert!(BurnRate::new("Fine", nineteen).validate().is_ok());
        assert!(
            MultiplySize::new("Fine", SizeAttribute::Disk, nineteen)
                .validate()
                .is_ok()
        );
        assert!(
            MultiplySize::new("Too fine", SizeAttribute::Ram, nineteen)
                .validate()
                .is_err()
        );
        assert!(
            MultiplySize::new("Half", SizeAttribute::Ram, dec!(0.50))
                .validate()
                .is_ok()
        );
        assert_eq!(
            MultiplySize::new("Half", SizeAttribute::Ram, dec!(0.50)).decimal_places(),
            11
        );
    }

    #[test]
    fn test_scale_overflow_is_an_error() {
        let size = Arc::new(Size::new("Huge", "test.huge", 1, 0, u32::MAX));
        let start = Utc.with_ymd_and_hms(2014, 7, 1, 0, 0, 0).unwrap();
        let e = HistoryEntry::new(Status::Active, size, start, start + TimeDelta::hours(1));
        let disk = MultiplySize::new("Disk", SizeAttribute::Disk, dec!(1000000000000000));

        let err = disk.scale(dec!(13132800), &e).unwrap_err();
        assert!(matches!(err, Error::ArithmeticOverflow { ref context } if context.contains("Disk")));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_burn_rate_scope() {
        let rate = BurnRate::new("Half suspended", dec!(0.5)).for_statuses([Status::Suspended]);
        assert!(rate.covers(&entry(Status::Suspended)));
        assert!(!rate.covers(&entry(Status::Active)));

        let unscoped = BurnRate::new("Double", dec!(2));
        assert!(unscoped.covers(&entry(Status::Active)));
    }

    #[test]
    fn test_negative_multiplier_invalid() {
        assert!(
            MultiplySize::new("neg", SizeAttribute::Cpu, dec!(-0.1))
                .validate()
                .is_err()
        );
        assert!(BurnRate::new("neg", dec!(-2)).validate().is_err());
        assert!(BurnRate::new("zero", dec!(0)).validate().is_ok());
    }

    #[test]
    fn test_empty_burn_scope_invalid() {
        let rate = BurnRate::new("nobody", dec!(1)).for_statuses([]);
        assert!(rate.validate().is_err());
    }
}
