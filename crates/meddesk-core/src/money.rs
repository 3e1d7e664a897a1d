//! Fixed-point currency helpers.
//!
//! Every currency field in the system is a [`Decimal`] with exactly two
//! fraction digits. Values are rounded once, at the point they are persisted
//! into a record, and are never stored as binary floating point.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to exactly two fraction digits using banker's rounding
/// (midpoint-to-even). The single rounding rule for the whole system.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_truncates_extra_precision() {
        assert_eq!(round2(dec("100.129")).to_string(), "100.13");
        assert_eq!(round2(dec("0.001")).to_string(), "0.00");
    }

    #[test]
    fn test_round2_midpoint_to_even() {
        assert_eq!(round2(dec("100.005")).to_string(), "100.00");
        assert_eq!(round2(dec("100.015")).to_string(), "100.02");
        assert_eq!(round2(dec("100.025")).to_string(), "100.02");
    }

    #[test]
    fn test_round2_pads_whole_numbers() {
        assert_eq!(round2(dec("100")).to_string(), "100.00");
        assert_eq!(round2(dec("5000.5")).to_string(), "5000.50");
    }
}
