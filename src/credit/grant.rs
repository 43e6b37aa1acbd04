//! Credit grants, their time units and recurring recharges.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::exact_mul;
use crate::window::{CalendarStep, Interval};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl TimeUnit {
    pub fn seconds(&self) -> Decimal {
        match self {
            Self::Second => Decimal::ONE,
            Self::Minute => dec!(60),
            Self::Hour => dec!(3600),
            Self::Day => dec!(86400),
            Self::Week => dec!(604800),
        }
    }
}

/// One-time increase to the credit balance, effective from `effective_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditGrant {
    pub name: String,
    pub unit: TimeUnit,
    pub amount: Decimal,
    pub effective_at: DateTime<Utc>,
}

impl CreditGrant {
    pub fn new(
        name: impl Into<String>,
        unit: TimeUnit,
        amount: Decimal,
        effective_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            unit,
            amount,
            effective_at,
        }
    }

    pub fn hours(name: impl Into<String>, amount: Decimal, effective_at: DateTime<Utc>) -> Self {
        Self::new(name, TimeUnit::Hour, amount, effective_at)
    }

    /// Grant amount normalised to seconds.
    pub fn seconds(&self) -> Result<Decimal> {
        exact_mul(self.amount, self.unit.seconds())
            .ok_or_else(|| Error::overflow(format!("credit '{}'", self.name)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount < Decimal::ZERO {
            return Err(Error::InvalidCredit {
                name: self.name.clone(),
                message: format!("amount must not be negative (got {})", self.amount),
            });
        }
        self.seconds().map(|_| ())
    }
}

/// A grant repeating every `every`, starting at `first_at`.
///
/// The engine only consumes discrete grants; callers expand recharges over
/// the accounting window first.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditRecharge {
    pub name: String,
    pub unit: TimeUnit,
    pub amount: Decimal,
    pub first_at: DateTime<Utc>,
    pub every: Interval,
}

impl CreditRecharge {
    pub fn new(
        name: impl Into<String>,
        unit: TimeUnit,
        amount: Decimal,
        first_at: DateTime<Utc>,
        every: Interval,
    ) -> Self {
        Self {
            name: name.into(),
            unit,
            amount,
            first_at,
            every,
        }
    }

    /// Discrete grants effective at `first_at`, `first_at + every`, ... before `until`.
    ///
    /// Calendar steps are taken from `first_at` each time, so a recharge on
    /// the 31st lands on the last day of shorter months without drifting.
    pub fn expand(&self, until: DateTime<Utc>) -> Result<Vec<CreditGrant>> {
        self.every.validate()?;
        let grant = CreditGrant::new(self.name.clone(), self.unit, self.amount, self.first_at);
        grant.validate()?;

        let mut grants = Vec::new();
        let mut occurrence = 0u32;
        let mut effective_at = self.first_at;
        while effective_at < until {
            grants.push(CreditGrant {
                effective_at,
                ..grant.clone()
            });
            occurrence += 1;
            effective_at = self.next_after(effective_at, occurrence)?;
        }
        Ok(grants)
    }

    fn next_after(&self, previous: DateTime<Utc>, occurrence: u32) -> Result<DateTime<Utc>> {
        match self.every {
            Interval::Calendar(step) => {
                let count = step.count.checked_mul(occurrence).ok_or_else(|| {
                    Error::InvalidCredit {
                        name: self.name.clone(),
                        message: "recharge schedule overflows".into(),
                    }
                })?;
                CalendarStep::new(step.unit, count).add(self.first_at)
            }
            Interval::Fixed(_) => self.every.advance(previous),
        }
    }
}
