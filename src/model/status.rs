//! Instance lifecycle statuses as recorded by the cloud provider.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Lifecycle status recorded in an instance history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    Active,
    Build,
    Pending,
    HardReboot,
    Reboot,
    Migrating,
    Rescue,
    Resize,
    VerifyResize,
    Shutoff,
    ShuttingDown,
    Suspended,
    Paused,
    Terminated,
    Deleted,
    Error,
    Unknown,
    NotAvailable,
}

impl Status {
    pub const ALL: [Status; 18] = [
        Status::Active,
        Status::Build,
        Status::Pending,
        Status::HardReboot,
        Status::Reboot,
        Status::Migrating,
        Status::Rescue,
        Status::Resize,
        Status::VerifyResize,
        Status::Shutoff,
        Status::ShuttingDown,
        Status::Suspended,
        Status::Paused,
        Status::Terminated,
        Status::Deleted,
        Status::Error,
        Status::Unknown,
        Status::NotAvailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Build => "build",
            Self::Pending => "pending",
            Self::HardReboot => "hard_reboot",
            Self::Reboot => "reboot",
            Self::Migrating => "migrating",
            Self::Rescue => "rescue",
            Self::Resize => "resize",
            Self::VerifyResize => "verify_resize",
            Self::Shutoff => "shutoff",
            Self::ShuttingDown => "shutting-down",
            Self::Suspended => "suspended",
            Self::Paused => "paused",
            Self::Terminated => "terminated",
            Self::Deleted => "deleted",
            Self::Error => "error",
            Self::Unknown => "unknown",
            Self::NotAvailable => "N/A",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for Status {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
