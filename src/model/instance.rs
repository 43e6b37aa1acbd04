//! Instances with validated, chronologically ordered status histories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntryEnd, HistoryEntry, Size, Status};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub identifier: String,
}

impl Provider {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Machine {
    pub name: String,
    pub identifier: String,
}

impl Machine {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

/// A virtual machine and its chronological status/size history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub identifier: String,
    pub provider: Provider,
    pub machine: Machine,
    pub history: Vec<HistoryEntry>,
}

impl Instance {
    pub fn builder(
        identifier: impl Into<String>,
        provider: Provider,
        machine: Machine,
    ) -> InstanceBuilder {
        InstanceBuilder {
            identifier: identifier.into(),
            provider,
            machine,
            history: Vec::new(),
        }
    }

    /// Checks the history is non-empty, chronological and non-overlapping.
    pub fn validate(&self) -> Result<()> {
        if self.history.is_empty() {
            return Err(Error::EmptyHistory {
                instance: self.identifier.clone(),
            });
        }

        for (index, entry) in self.history.iter().enumerate() {
            if let EntryEnd::At(end) = entry.end
                && end < entry.start
            {
                return Err(Error::InvertedEntry {
                    instance: self.identifier.clone(),
                    index,
                });
            }

            let Some(previous) = index.checked_sub(1).map(|i| &self.history[i]) else {
                continue;
            };
            if entry.start < previous.start {
                return Err(Error::UnorderedHistory {
                    instance: self.identifier.clone(),
                    index,
                });
            }
            let overlaps = match previous.end {
                EntryEnd::Ongoing => true,
                EntryEnd::At(end) => end > entry.start,
            };
            if overlaps {
                return Err(Error::OverlappingHistory {
                    instance: self.identifier.clone(),
                    index,
                });
            }
        }
        Ok(())
    }
}

/// Appends history entries to build an [`Instance`].
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    identifier: String,
    provider: Provider,
    machine: Machine,
    history: Vec<HistoryEntry>,
}

impl InstanceBuilder {
    pub fn entry(mut self, entry: HistoryEntry) -> Self {
        self.history.push(entry);
        self
    }

    pub fn status(
        self,
        status: Status,
        size: &Arc<Size>,
        start: DateTime<Utc>,
        end: impl Into<EntryEnd>,
    ) -> Self {
        self.entry(HistoryEntry::new(status, Arc::clone(size), start, end))
    }

    /// Builds the instance, rejecting invalid history.
    pub fn build(self) -> Result<Instance> {
        let instance = Instance {
            identifier: self.identifier,
            provider: self.provider,
            machine: self.machine,
            history: self.history,
        };
        instance.validate()?;
        Ok(instance)
    }
}
