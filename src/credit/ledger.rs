//! Per-sub-period credit accrual, balances and carry forward.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CreditGrant;
use crate::model::{exact_add, exact_sum};
use crate::window::{AccountingWindow, SubPeriod};
use crate::{Error, Result};

/// Non-fatal condition noticed while accruing credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ambiguity {
    /// A grant effective before the window start was ignored rather than
    /// carried in as a remainder.
    GrantBeforeWindow {
        name: String,
        effective_at: DateTime<Utc>,
        window_start: DateTime<Utc>,
    },
}

impl std::fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GrantBeforeWindow {
                name,
                effective_at,
                window_start,
            } => write!(
                f,
                "grant '{name}' effective {effective_at} precedes window start {window_start} and was ignored"
            ),
        }
    }
}

/// Credit position of one sub-period, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBalance {
    /// Balance carried in from the previous sub-period.
    pub opening: Decimal,
    /// Grants that became effective during this sub-period.
    pub granted: Decimal,
    pub available: Decimal,
    pub consumed: Decimal,
    /// `available - consumed`. Never clamped; negative means overdrawn.
    pub remaining: Decimal,
}

impl PeriodBalance {
    pub fn is_overdrawn(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Accrues grants per sub-period and rolls balances forward when enabled.
///
/// Only grants effective within `[window.start, window.end)` count. Each one
/// is credited to the sub-period it becomes effective in. Without carry
/// forward every sub-period opens at zero.
///
/// Sub-periods must be settled in chronological order.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    /// Applicable grants in seconds, sorted by effective time.
    grants: Vec<(DateTime<Utc>, Decimal)>,
    /// First grant not yet credited to a settled sub-period.
    next: usize,
    total_credit: Decimal,
    carry_forward: bool,
    balance: Decimal,
    ambiguities: Vec<Ambiguity>,
}

impl CreditLedger {
    pub fn open(
        grants: &[CreditGrant],
        window: &AccountingWindow,
        carry_forward: bool,
    ) -> Result<Self> {
        let mut applicable = Vec::with_capacity(grants.len());
        let mut ambiguities = Vec::new();

        for grant in grants {
            if grant.effective_at < window.start {
                tracing::warn!(
                    grant = %grant.name,
                    effective_at = %grant.effective_at,
                    window_start = %window.start,
                    "Ignoring credit grant effective before the accounting window"
                );
                ambiguities.push(Ambiguity::GrantBeforeWindow {
                    name: grant.name.clone(),
                    effective_at: grant.effective_at,
                    window_start: window.start,
                });
            } else if grant.effective_at >= window.end {
                tracing::debug!(
                    grant = %grant.name,
                    effective_at = %grant.effective_at,
                    "Credit grant effective after the accounting window"
                );
            } else {
                applicable.push((grant.effective_at, grant.seconds()?));
            }
        }
        applicable.sort_by_key(|(effective_at, _)| *effective_at);
        let total_credit = exact_sum(applicable.iter().map(|(_, seconds)| *seconds))
            .ok_or_else(|| Error::overflow("total credit"))?;

        Ok(Self {
            grants: applicable,
            next: 0,
            total_credit,
            carry_forward,
            balance: Decimal::ZERO,
            ambiguities,
        })
    }

    /// Credits `period` with its grants, charges `consumed` and rolls the balance.
    pub fn settle(&mut self, period: &SubPeriod, consumed: Decimal) -> Result<PeriodBalance> {
        let opening = if self.carry_forward {
            self.balance
        } else {
            Decimal::ZERO
        };

        let mut granted = Decimal::ZERO;
        while let Some(&(effective_at, seconds)) = self.grants.get(self.next) {
            if effective_at >= period.end {
                break;
            }
            if effective_at >= period.start {
                granted = exact_add(granted, seconds)
                    .ok_or_else(|| Error::overflow("sub-period credit"))?;
            }
            self.next += 1;
        }

        let overflow = || Error::overflow("credit balance");
        let available = exact_add(opening, granted).ok_or_else(overflow)?;
        let remaining = exact_add(available, -consumed).ok_or_else(overflow)?;
        self.balance = remaining;

        Ok(PeriodBalance {
            opening,
            granted,
            available,
            consumed,
            remaining,
        })
    }

    /// Sum of every grant applicable within the window, in seconds.
    pub fn total_credit(&self) -> Decimal {
        self.total_credit
    }

    /// Remaining balance after the last settled sub-period.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn carries_forward(&self) -> bool {
        self.carry_forward
    }

    pub fn ambiguities(&self) -> &[Ambiguity] {
        &self.ambiguities
    }

    pub fn into_ambiguities(self) -> Vec<Ambiguity> {
        self.ambiguities
    }
}
