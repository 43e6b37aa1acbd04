//! Status filters that exclude history entries from counted time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, Status};
use crate::{Error, Result};

/// Excludes entries whose status is in the configured set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreStatus {
    pub name: String,
    pub statuses: BTreeSet<Status>,
}

impl IgnoreStatus {
    pub fn new(name: impl Into<String>, statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            name: name.into(),
            statuses: statuses.into_iter().collect(),
        }
    }

    /// Builds the filter from status names, rejecting unknown ones.
    pub fn parse<S: AsRef<str>>(
        name: impl Into<String>,
        statuses: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let statuses = statuses
            .into_iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<BTreeSet<Status>>>()?;
        Ok(Self {
            name: name.into(),
            statuses,
        })
    }

    pub fn excludes(&self, entry: &HistoryEntry) -> bool {
        self.statuses.contains(&entry.status)
    }

    pub(super) fn validate(&self) -> Result<()> {
        if self.statuses.is_empty() {
            return Err(Error::InvalidRule {
                rule: self.name.clone(),
                message: "status filter has no statuses".into(),
            });
        }
        Ok(())
    }
}
