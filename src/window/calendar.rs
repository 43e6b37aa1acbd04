//! Sub-periods aligned to UTC day, month, quarter and year boundaries.
//!
//! Each boundary is floored to the start of its unit before stepping, so a
//! window opening mid-month gets a short first sub-period. The last one is
//! clipped to the window end.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SplitStrategy, SubPeriod, split_with};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarUnit {
    Day,
    Month,
    Quarter,
    Year,
}

impl CalendarUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    fn months(&self) -> Option<u32> {
        match self {
            Self::Day => None,
            Self::Month => Some(1),
            Self::Quarter => Some(3),
            Self::Year => Some(12),
        }
    }
}

/// `count` calendar units, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarStep {
    pub unit: CalendarUnit,
    pub count: u32,
}

impl CalendarStep {
    pub fn new(unit: CalendarUnit, count: u32) -> Self {
        Self { unit, count }
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::InvalidSubdivision(format!(
                "calendar step of zero {}s",
                self.unit.as_str()
            )));
        }
        Ok(())
    }

    /// Adds `count` units to `from`, keeping the time of day.
    ///
    /// Month arithmetic clamps to the end of shorter months.
    pub fn add(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let next = match self.unit.months() {
            None => from.checked_add_days(Days::new(u64::from(self.count))),
            Some(months) => self
                .count
                .checked_mul(months)
                .and_then(|total| from.checked_add_months(Months::new(total))),
        };
        next.ok_or_else(|| {
            Error::InvalidSubdivision(format!(
                "{from} + {} {}s is out of range",
                self.count,
                self.unit.as_str()
            ))
        })
    }

    /// Start of the unit containing `instant`.
    pub fn floor(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = instant.date_naive();
        let floored = match self.unit {
            CalendarUnit::Day => Some(date),
            CalendarUnit::Month => date.with_day(1),
            CalendarUnit::Quarter => {
                NaiveDate::from_ymd_opt(date.year(), (date.month0() / 3) * 3 + 1, 1)
            }
            CalendarUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        // The first day of an existing month or year always exists.
        floored.unwrap_or(date).and_time(NaiveTime::MIN).and_utc()
    }
}

/// Sub-period boundaries on calendar unit starts (e.g. the first of each month).
///
/// The first and last sub-periods are partial when the window does not start
/// or end on a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarAligned {
    step: CalendarStep,
}

impl CalendarAligned {
    pub fn new(step: CalendarStep) -> Self {
        Self { step }
    }

    pub fn step(&self) -> CalendarStep {
        self.step
    }

    fn next_boundary(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.step.add(self.step.floor(from))
    }
}

impl SplitStrategy for CalendarAligned {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn validate(&self) -> Result<()> {
        self.step.validate()
    }

    fn split(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SubPeriod>> {
        self.validate()?;
        split_with(start, end, |from| self.next_boundary(from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn monthly() -> CalendarAligned {
        CalendarAligned::new(CalendarStep::new(CalendarUnit::Month, 1))
    }

    #[test]
    fn test_monthly_aligned_window() {
        let periods = monthly()
            .split(at(2014, 7, 1, 0), at(2014, 12, 1, 0))
            .unwrap();
        let starts: Vec<u32> = periods.iter().map(|p| p.start.month()).collect();
        assert_eq!(starts, vec![7, 8, 9, 10, 11]);
        assert!(periods.iter().all(|p| p.start.day() == 1));
    }

    #[test]
    fn test_monthly_partial_edges() {
        let periods = monthly()
            .split(at(2014, 7, 15, 12), at(2014, 9, 10, 0))
            .unwrap();
        assert_eq!(
            periods,
            vec![
                SubPeriod::new(at(2014, 7, 15, 12), at(2014, 8, 1, 0)),
                SubPeriod::new(at(2014, 8, 1, 0), at(2014, 9, 1, 0)),
                SubPeriod::new(at(2014, 9, 1, 0), at(2014, 9, 10, 0)),
            ]
        );
    }

    #[test]
    fn test_quarter_floor() {
        let step = CalendarStep::new(CalendarUnit::Quarter, 1);
        assert_eq!(step.floor(at(2014, 8, 20, 5)), at(2014, 7, 1, 0));
        assert_eq!(step.floor(at(2014, 12, 31, 23)), at(2014, 10, 1, 0));
        assert_eq!(step.floor(at(2014, 1, 1, 0)), at(2014, 1, 1, 0));
    }

    #[test]
    fn test_yearly_split_across_new_year() {
        let yearly = CalendarAligned::new(CalendarStep::new(CalendarUnit::Year, 1));
        let periods = yearly
            .split(at(2014, 11, 1, 0), at(2015, 2, 1, 0))
            .unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].end, at(2015, 1, 1, 0));
    }

    #[test]
    fn test_daily_steps_floor_to_midnight() {
        let weekly = CalendarAligned::new(CalendarStep::new(CalendarUnit::Day, 7));
        let periods = weekly
            .split(at(2014, 7, 1, 6), at(2014, 7, 20, 0))
            .unwrap();
        assert_eq!(periods[0].end, at(2014, 7, 8, 0));
        assert_eq!(periods[1].end, at(2014, 7, 15, 0));
        assert_eq!(periods[2].end, at(2014, 7, 20, 0));
    }

    #[test]
    fn test_month_add_clamps() {
        let step = CalendarStep::new(CalendarUnit::Month, 1);
        assert_eq!(step.add(at(2014, 1, 31, 0)).unwrap(), at(2014, 2, 28, 0));
    }

    #[test]
    fn test_zero_count_invalid() {
        let err = CalendarAligned::new(CalendarStep::new(CalendarUnit::Month, 0))
            .split(at(2014, 7, 1, 0), at(2014, 8, 1, 0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSubdivision(_)));
    }
}
