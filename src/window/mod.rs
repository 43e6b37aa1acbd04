//! Accounting windows and the strategies that subdivide them.
//!
//! Every strategy produces an ordered, contiguous, non-overlapping list of
//! half-open sub-periods covering exactly `[start, end)`.

mod calendar;
mod fixed;

pub use calendar::{CalendarAligned, CalendarStep, CalendarUnit};
pub use fixed::FixedDuration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One contiguous slice `[start, end)` of the accounting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SubPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Single interface over the subdivision strategies.
pub trait SplitStrategy {
    fn name(&self) -> &'static str;

    /// Rejects parameters that cannot produce a valid split.
    fn validate(&self) -> Result<()>;

    /// Splits `[start, end)` into contiguous sub-periods.
    fn split(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SubPeriod>>;
}

/// Walks boundaries produced by `next` from `start`, clipping the last one to `end`.
pub(crate) fn split_with(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    mut next: impl FnMut(DateTime<Utc>) -> Result<DateTime<Utc>>,
) -> Result<Vec<SubPeriod>> {
    let mut periods = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let boundary = next(cursor)?;
        if boundary <= cursor {
            return Err(Error::InvalidSubdivision(format!(
                "boundary after {cursor} does not advance"
            )));
        }
        let sub_end = boundary.min(end);
        periods.push(SubPeriod::new(cursor, sub_end));
        cursor = sub_end;
    }
    Ok(periods)
}

/// No subdivision: one sub-period spanning the whole window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cumulative;

impl SplitStrategy for Cumulative {
    fn name(&self) -> &'static str {
        "cumulative"
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn split(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SubPeriod>> {
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(vec![SubPeriod::new(start, end)])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Subdivision {
    #[default]
    Cumulative,
    Fixed(FixedDuration),
    Calendar(CalendarAligned),
}

impl Subdivision {
    pub fn fixed(every: TimeDelta) -> Self {
        Self::Fixed(FixedDuration::new(every))
    }

    pub fn calendar(unit: CalendarUnit, count: u32) -> Self {
        Self::Calendar(CalendarAligned::new(CalendarStep::new(unit, count)))
    }

    pub fn monthly() -> Self {
        Self::calendar(CalendarUnit::Month, 1)
    }

    pub fn strategy(&self) -> &dyn SplitStrategy {
        match self {
            Self::Cumulative => &Cumulative,
            Self::Fixed(strategy) => strategy,
            Self::Calendar(strategy) => strategy,
        }
    }
}

impl From<Interval> for Subdivision {
    fn from(interval: Interval) -> Self {
        match interval {
            Interval::Fixed(every) => Self::fixed(every),
            Interval::Calendar(step) => Self::Calendar(CalendarAligned::new(step)),
        }
    }
}

/// A repeating step, used for recurring credit recharges.
///
/// Unlike calendar-aligned subdivision, stepping is relative to the instant
/// it starts from: a monthly step from the 15th lands on the next 15th.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Fixed(TimeDelta),
    Calendar(CalendarStep),
}

impl Interval {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Fixed(every) => FixedDuration::new(*every).validate(),
            Self::Calendar(step) => step.validate(),
        }
    }

    pub fn advance(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match self {
            Self::Fixed(every) => FixedDuration::new(*every).advance(from),
            Self::Calendar(step) => step.add(from),
        }
    }
}

/// The overall `[start, end)` range allocation is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub subdivision: Subdivision,
}

impl AccountingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            subdivision: Subdivision::Cumulative,
        }
    }

    pub fn subdivided(mut self, subdivision: Subdivision) -> Self {
        self.subdivision = subdivision;
        self
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(Error::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        self.subdivision.strategy().validate()
    }

    /// Validates the window and splits it with its subdivision strategy.
    pub fn split(&self) -> Result<Vec<SubPeriod>> {
        self.validate()?;
        self.subdivision.strategy().split(self.start, self.end)
    }
}
