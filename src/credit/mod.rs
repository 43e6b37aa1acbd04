//! Credit grants and the ledger that accrues them across sub-periods.

mod grant;
mod ledger;

pub use grant::{CreditGrant, CreditRecharge, TimeUnit};
pub use ledger::{Ambiguity, CreditLedger, PeriodBalance};
