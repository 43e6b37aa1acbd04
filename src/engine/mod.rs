//! Allocation calculation: validate, split, count, settle, aggregate.
//!
//! ```rust
//! use allocation_engine::{AccountingWindow, AllocationEngine, AllocationRequest, CreditGrant};
//! use chrono::{TimeZone, Utc};
//! use rust_decimal_macros::dec;
//!
//! # fn main() -> allocation_engine::Result<()> {
//! let start = Utc.with_ymd_and_hms(2014, 7, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2014, 12, 1, 0, 0, 0).unwrap();
//!
//! let request = AllocationRequest::builder(AccountingWindow::new(start, end))
//!     .credit(CreditGrant::hours("Add 10,000 Hours", dec!(10000), start))
//!     .build()?;
//!
//! let result = AllocationEngine::at(end).calculate(&request)?;
//! assert!(!result.over_allocation());
//! # Ok(())
//! # }
//! ```

mod request;
mod result;

pub use request::{AllocationRequest, AllocationRequestBuilder};
pub use result::{AllocationResult, InstanceUsage, PeriodResult};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::credit::CreditLedger;
use crate::model::{Instance, exact_add, exact_sum, seconds};
use crate::{Error, Result};
use crate::rules::RulePipeline;
use crate::window::SubPeriod;

/// Stateless calculator. The only setting is the clock used to close
/// ongoing history entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationEngine {
    now: Option<DateTime<Utc>>,
}

impl AllocationEngine {
    /// Engine that closes ongoing entries at the wall clock time of each calculation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that closes ongoing entries at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    pub fn calculate(&self, request: &AllocationRequest) -> Result<AllocationResult> {
        let now = self.now.unwrap_or_else(Utc::now);
        let pipeline = RulePipeline::new(&request.rules);
        let span = tracing::info_span!(
            "allocation.calculate",
            instances = request.instances.len(),
            rules = pipeline.len(),
            credits = request.credits.len(),
            strategy = request.window.subdivision.strategy().name(),
        );
        let _enter = span.enter();

        request.validate()?;
        let sub_periods = request.window.split()?;
        let mut ledger = CreditLedger::open(
            &request.credits,
            &request.window,
            pipeline.carries_forward(),
        )?;

        let mut periods = Vec::with_capacity(sub_periods.len());
        for sub_period in &sub_periods {
            let mut instances = Vec::new();
            for instance in &request.instances {
                let usage = usage(instance, sub_period, pipeline, now)?;
                if !usage.runtime.is_zero() {
                    instances.push(usage);
                }
            }
            let runtime = exact_sum(instances.iter().map(|u| u.runtime))
                .ok_or_else(|| Error::overflow("sub-period runtime"))?;
            let counted = exact_sum(instances.iter().map(|u| u.counted))
                .ok_or_else(|| Error::overflow("sub-period counted time"))?;
            let balance = ledger.settle(sub_period, counted)?;

            tracing::debug!(
                start = %sub_period.start,
                end = %sub_period.end,
                %runtime,
                %counted,
                available = %balance.available,
                remaining = %balance.remaining,
                "Settled sub-period"
            );

            periods.push(PeriodResult {
                start: sub_period.start,
                end: sub_period.end,
                runtime,
                counted,
                balance,
                instances,
            });
        }

        let total_credit = ledger.total_credit();
        let carry_forward = ledger.carries_forward();
        let result = AllocationResult::new(
            periods,
            total_credit,
            carry_forward,
            ledger.into_ambiguities(),
        )?;
        tracing::info!(
            periods = result.periods().len(),
            total_runtime = %result.total_runtime(),
            total_counted_time = %result.total_counted_time(),
            total_credit = %result.total_credit(),
            over_allocation = result.over_allocation(),
            "Allocation calculated"
        );
        Ok(result)
    }
}

/// Calculates with the current wall clock closing ongoing entries.
pub fn calculate(request: &AllocationRequest) -> Result<AllocationResult> {
    AllocationEngine::new().calculate(request)
}

fn usage(
    instance: &Instance,
    period: &SubPeriod,
    pipeline: RulePipeline<'_>,
    now: DateTime<Utc>,
) -> Result<InstanceUsage> {
    let overflow = || Error::overflow(format!("usage of instance {}", instance.identifier));
    let mut runtime = Decimal::ZERO;
    let mut counted = Decimal::ZERO;
    for entry in &instance.history {
        let overlap = entry.overlap(period.start, period.end, now);
        if overlap.is_zero() {
            continue;
        }
        let raw = seconds(overlap);
        runtime = exact_add(runtime, raw).ok_or_else(overflow)?;
        counted = exact_add(counted, pipeline.counted(raw, entry)?).ok_or_else(overflow)?;
    }
    Ok(InstanceUsage {
        identifier: instance.identifier.clone(),
        runtime,
        counted,
    })
}
