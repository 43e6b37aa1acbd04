//! # allocation-engine
//!
//! Computes how much of a time-based compute allocation a set of instances
//! consumed over an accounting window.
//!
//! Raw runtime comes from each instance's status history. An ordered rule
//! pipeline turns it into counted time (status filters, size multipliers,
//! burn rates). A credit ledger tracks granted time per sub-period, and the
//! window splitter decides how the window is subdivided.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use allocation_engine::rules::presets;
//! use allocation_engine::{
//!     AccountingWindow, AllocationEngine, AllocationRequest, CreditGrant, Instance, Machine,
//!     Provider, Size, Status,
//! };
//! use chrono::{TimeZone, Utc};
//! use rust_decimal_macros::dec;
//!
//! # fn main() -> allocation_engine::Result<()> {
//! let start = Utc.with_ymd_and_hms(2014, 7, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2014, 12, 1, 0, 0, 0).unwrap();
//! let tiny = Arc::new(Size::new("Tiny", "1", 1, 512, 0));
//!
//! let instance = Instance::builder(
//!     "vm-1",
//!     Provider::new("Cloud", "p1"),
//!     Machine::new("Ubuntu", "m1"),
//! )
//! .status(Status::Active, &tiny, start, Some(end))
//! .build()?;
//!
//! let request = AllocationRequest::builder(AccountingWindow::new(start, end))
//!     .credit(CreditGrant::hours("Add 10,000 Hours", dec!(10000), start))
//!     .rule(presets::multiply_by_cpu())
//!     .instance(instance)
//!     .build()?;
//!
//! let result = AllocationEngine::new().calculate(&request)?;
//! assert!(!result.over_allocation());
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod credit;
pub mod engine;
pub mod model;
pub mod rules;
pub mod window;

pub use config::{AllocationPolicy, ConfigError, PolicyBuilder, PolicySource};
pub use credit::{Ambiguity, CreditGrant, CreditLedger, CreditRecharge, PeriodBalance, TimeUnit};
pub use engine::{
    AllocationEngine, AllocationRequest, AllocationRequestBuilder, AllocationResult,
    InstanceUsage, PeriodResult, calculate,
};
pub use model::{
    EntryEnd, HistoryEntry, Instance, InstanceBuilder, Machine, Provider, Size, SizeAttribute,
    Status,
};
pub use rules::{BurnRate, CarryForward, IgnoreStatus, MultiplySize, Rule, RulePipeline};
pub use window::{
    AccountingWindow, CalendarAligned, CalendarStep, CalendarUnit, Cumulative, FixedDuration,
    Interval, SplitStrategy, SubPeriod, Subdivision,
};

use chrono::{DateTime, Utc};

/// Error type for allocation-engine operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Window end is not after its start.
    #[error("Invalid accounting window: {start} is not before {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid subdivision: {0}")]
    InvalidSubdivision(String),

    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    #[error("Invalid credit '{name}': {message}")]
    InvalidCredit { name: String, message: String },

    #[error("Unknown instance status: {0}")]
    UnknownStatus(String),

    /// A counted or credited quantity left the range `Decimal` holds exactly.
    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    /// Policy source could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Instance {instance} has no status history")]
    EmptyHistory { instance: String },

    /// History entry ends before it starts.
    #[error("Instance {instance}: history entry {index} ends before it starts")]
    InvertedEntry { instance: String, index: usize },

    #[error("Instance {instance}: history entry {index} starts before its predecessor")]
    UnorderedHistory { instance: String, index: usize },

    #[error("Instance {instance}: history entry {index} overlaps its predecessor")]
    OverlappingHistory { instance: String, index: usize },
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Windows, subdivisions, rules, credits or policy sources
    Configuration,
    /// Malformed instance history
    Data,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidWindow { .. }
            | Error::InvalidSubdivision(_)
            | Error::InvalidRule { .. }
            | Error::InvalidCredit { .. }
            | Error::UnknownStatus(_)
            | Error::ArithmeticOverflow { .. }
            | Error::Config(_) => ErrorCategory::Configuration,

            Error::EmptyHistory { .. }
            | Error::InvertedEntry { .. }
            | Error::UnorderedHistory { .. }
            | Error::OverlappingHistory { .. } => ErrorCategory::Data,
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        Error::ArithmeticOverflow {
            context: context.into(),
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_data_error(&self) -> bool {
        self.category() == ErrorCategory::Data
    }
}

/// Result type alias for allocation-engine operations.
pub type Result<T> = std::result::Result<T, Error>;
