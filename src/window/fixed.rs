//! Fixed elapsed-duration sub-periods.

use chrono::{DateTime, TimeDelta, Utc};

use super::{SplitStrategy, SubPeriod, split_with};
use crate::{Error, Result};

/// Equal-length sub-periods of pure elapsed time, anchored at window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDuration {
    every: TimeDelta,
}

impl FixedDuration {
    pub fn new(every: TimeDelta) -> Self {
        Self { every }
    }

    pub fn every(&self) -> TimeDelta {
        self.every
    }

    pub(crate) fn advance(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        from.checked_add_signed(self.every).ok_or_else(|| {
            Error::InvalidSubdivision(format!("{from} + {} is out of range", self.every))
        })
    }
}

impl SplitStrategy for FixedDuration {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn validate(&self) -> Result<()> {
        if self.every <= TimeDelta::zero() {
            return Err(Error::InvalidSubdivision(format!(
                "fixed duration must be positive (got {})",
                self.every
            )));
        }
        Ok(())
    }

    fn split(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SubPeriod>> {
        self.validate()?;
        split_with(start, end, |from| self.advance(from))
    }
}
