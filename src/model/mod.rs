//! Instance, size and history value types consumed by the engine.

mod history;
mod instance;
mod size;
mod status;

pub use history::{EntryEnd, HistoryEntry};
pub use instance::{Instance, InstanceBuilder, Machine, Provider};
pub use size::{Size, SizeAttribute};
pub use status::Status;

use chrono::TimeDelta;
use rust_decimal::Decimal;

/// Decimal places of a [`seconds`] value (nanosecond resolution).
pub const SECONDS_SCALE: u32 = 9;

/// Most decimal places a `Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Exact conversion of an elapsed duration into decimal seconds.
pub fn seconds(delta: TimeDelta) -> Decimal {
    Decimal::from(delta.num_seconds())
        + Decimal::new(i64::from(delta.subsec_nanos()), SECONDS_SCALE)
}

/// Product of two quantities, or `None` if it overflows or would be rounded.
pub fn exact_mul(lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    if lhs.is_zero() || rhs.is_zero() {
        return Some(Decimal::ZERO);
    }
    let (lhs, rhs) = (lhs.normalize(), rhs.normalize());
    let product = lhs.checked_mul(rhs)?;
    // Decimal only gives up scale when it rounds.
    (product.scale() == lhs.scale() + rhs.scale()).then_some(product)
}

/// Sum of two quantities, or `None` if it overflows or would be rounded.
pub fn exact_add(lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    if lhs.is_zero() {
        return Some(rhs);
    }
    if rhs.is_zero() {
        return Some(lhs);
    }
    let sum = lhs.checked_add(rhs)?;
    (sum.is_zero() || sum.scale() == lhs.scale().max(rhs.scale())).then_some(sum)
}

pub fn exact_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, exact_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_seconds_conversion() {
        assert_eq!(seconds(TimeDelta::hours(1)), dec!(3600));
        assert_eq!(seconds(TimeDelta::milliseconds(1500)), dec!(1.5));
        assert_eq!(seconds(TimeDelta::zero()), Decimal::ZERO);
    }

    #[test]
    fn test_exact_mul_keeps_every_digit() {
        assert_eq!(exact_mul(dec!(3600.5), dec!(0.25)), Some(dec!(900.125)));
        assert_eq!(exact_mul(dec!(0.50), dec!(2.0)), Some(dec!(1)));
        assert_eq!(exact_mul(Decimal::MAX, Decimal::ZERO), Some(Decimal::ZERO));
    }

    #[test]
    fn test_exact_mul_refuses_rounding() {
        let third = dec!(0.3333333333333333333333333333);
        assert_eq!(exact_mul(dec!(7.000000001), third), None);
        assert_eq!(exact_mul(Decimal::MAX, dec!(2)), None);
    }

    #[test]
    fn test_exact_add_refuses_rounding() {
        assert_eq!(exact_add(dec!(1.5), dec!(-1.5)), Some(Decimal::ZERO));
        assert_eq!(exact_add(Decimal::MAX, Decimal::ONE), None);
        // 30 significant digits cannot be held.
        assert_eq!(
            exact_add(Decimal::from_i128_with_scale(10_i128.pow(20), 0), dec!(0.000000001)),
            None
        );
        assert_eq!(exact_sum([dec!(1), dec!(2.5), dec!(0.25)]), Some(dec!(3.75)));
    }

    #[test]
    fn test_seconds_conversion_negative() {
        assert_eq!(seconds(TimeDelta::milliseconds(-1500)), dec!(-1.5));
    }
}
