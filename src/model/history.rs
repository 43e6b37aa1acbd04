//! Status history entries and their overlap with a time range.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{Size, Status};

/// End of a history entry. Ongoing entries have not ended yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryEnd {
    At(DateTime<Utc>),
    Ongoing,
}

impl EntryEnd {
    /// Concrete end instant, with ongoing entries ending at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::At(end) => *end,
            Self::Ongoing => now,
        }
    }

    pub fn is_ongoing(&self) -> bool {
        matches!(self, Self::Ongoing)
    }
}

impl From<DateTime<Utc>> for EntryEnd {
    fn from(end: DateTime<Utc>) -> Self {
        Self::At(end)
    }
}

impl From<Option<DateTime<Utc>>> for EntryEnd {
    fn from(end: Option<DateTime<Utc>>) -> Self {
        end.map_or(Self::Ongoing, Self::At)
    }
}

/// An instance was in `status`, at `size`, from `start` until `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: Status,
    pub size: Arc<Size>,
    pub start: DateTime<Utc>,
    pub end: EntryEnd,
}

impl HistoryEntry {
    pub fn new(
        status: Status,
        size: Arc<Size>,
        start: DateTime<Utc>,
        end: impl Into<EntryEnd>,
    ) -> Self {
        Self {
            status,
            size,
            start,
            end: end.into(),
        }
    }

    /// Wall-clock time this entry spends inside `[from, to)`.
    ///
    /// Ongoing entries are clipped to `now` before intersecting. Entries that
    /// do not intersect the range yield zero.
    pub fn overlap(&self, from: DateTime<Utc>, to: DateTime<Utc>, now: DateTime<Utc>) -> TimeDelta {
        let start = self.start.max(from);
        let end = self.end.resolve(now).min(to);
        if end > start {
            end - start
        } else {
            TimeDelta::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 7, day, 0, 0, 0).unwrap()
    }

    fn entry(start: u32, end: EntryEnd) -> HistoryEntry {
        let size = Arc::new(Size::new("Kids Fry", "test.tiny", 1, 2048, 0));
        HistoryEntry::new(Status::Active, size, at(start), end)
    }

    #[test]
    fn test_overlap_inside_range() {
        let e = entry(5, EntryEnd::At(at(10)));
        assert_eq!(e.overlap(at(1), at(31), at(31)), TimeDelta::days(5));
    }

    #[test]
    fn test_overlap_clipped_both_sides() {
        let e = entry(1, EntryEnd::At(at(20)));
        assert_eq!(e.overlap(at(5), at(8), at(31)), TimeDelta::days(3));
    }

    #[test]
    fn test_overlap_disjoint_is_zero() {
        let e = entry(1, EntryEnd::At(at(5)));
        assert_eq!(e.overlap(at(5), at(10), at(31)), TimeDelta::zero());
        assert_eq!(e.overlap(at(10), at(20), at(31)), TimeDelta::zero());
    }

    #[test]
    fn test_ongoing_clipped_to_now() {
        let e = entry(1, EntryEnd::Ongoing);
        assert_eq!(e.overlap(at(1), at(31), at(11)), TimeDelta::days(10));
        assert_eq!(e.overlap(at(1), at(6), at(11)), TimeDelta::days(5));
    }

    #[test]
    fn test_ongoing_started_after_now() {
        let e = entry(20, EntryEnd::Ongoing);
        assert_eq!(e.overlap(at(1), at(31), at(10)), TimeDelta::zero());
    }

    #[test]
    fn test_entry_end_from_option() {
        assert_eq!(EntryEnd::from(None), EntryEnd::Ongoing);
        assert_eq!(EntryEnd::from(Some(at(3))), EntryEnd::At(at(3)));
    }
}
