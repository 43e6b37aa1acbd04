//! Per-period and whole-window outcomes of a calculation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::credit::{Ambiguity, PeriodBalance};
use crate::model::exact_sum;
use crate::{Error, Result};

/// One instance's contribution to a sub-period, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceUsage {
    pub identifier: String,
    pub runtime: Decimal,
    pub counted: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodResult {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Raw wall-clock seconds, before rules.
    pub runtime: Decimal,
    /// Seconds after rules, charged against credit.
    pub counted: Decimal,
    pub balance: PeriodBalance,
    /// Instances with any runtime in this sub-period.
    pub instances: Vec<InstanceUsage>,
}

/// Outcome of one allocation calculation. All quantities are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    periods: Vec<PeriodResult>,
    total_runtime: Decimal,
    total_counted_time: Decimal,
    total_credit: Decimal,
    carry_forward: bool,
    ambiguities: Vec<Ambiguity>,
}

impl AllocationResult {
    pub(crate) fn new(
        periods: Vec<PeriodResult>,
        total_credit: Decimal,
        carry_forward: bool,
        ambiguities: Vec<Ambiguity>,
    ) -> Result<Self> {
        let total_runtime = exact_sum(periods.iter().map(|p| p.runtime))
            .ok_or_else(|| Error::overflow("total runtime"))?;
        let total_counted_time = exact_sum(periods.iter().map(|p| p.counted))
            .ok_or_else(|| Error::overflow("total counted time"))?;
        Ok(Self {
            periods,
            total_runtime,
            total_counted_time,
            total_credit,
            carry_forward,
            ambiguities,
        })
    }

    pub fn periods(&self) -> &[PeriodResult] {
        &self.periods
    }

    /// Raw wall-clock seconds across all instances, before rules.
    ///
    /// Status filters do not reduce this figure; they only affect
    /// [`total_counted_time`](Self::total_counted_time).
    pub fn total_runtime(&self) -> Decimal {
        self.total_runtime
    }

    pub fn total_counted_time(&self) -> Decimal {
        self.total_counted_time
    }

    pub fn total_credit(&self) -> Decimal {
        self.total_credit
    }

    pub fn total_difference(&self) -> Decimal {
        self.total_credit - self.total_counted_time
    }

    pub fn over_allocation(&self) -> bool {
        self.total_difference() < Decimal::ZERO
    }

    /// Remaining balance of the last sub-period.
    ///
    /// Equals [`total_difference`](Self::total_difference) when carry forward
    /// is active.
    pub fn final_balance(&self) -> Decimal {
        self.periods
            .last()
            .map_or(self.total_credit, |p| p.balance.remaining)
    }

    pub fn carry_forward(&self) -> bool {
        self.carry_forward
    }

    pub fn ambiguities(&self) -> &[Ambiguity] {
        &self.ambiguities
    }
}
