//! Percentage movement between two consecutive rates.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// `(latest - previous) / previous * 100`.
///
/// A pair with no previous rate, or a previous rate of zero, reports no
/// movement instead of failing the read. Ratios too large for `Decimal` are
/// computed in `f64`.
pub fn change_percent(latest: Decimal, previous: Option<Decimal>) -> f64 {
    let Some(previous) = previous else {
        return 0.0;
    };
    if previous.is_zero() {
        return 0.0;
    }

    latest
        .checked_sub(previous)
        .and_then(|diff| diff.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or_else(|| float_change(latest, previous))
}

fn float_change(latest: Decimal, previous: Decimal) -> f64 {
    match (latest.to_f64(), previous.to_f64()) {
        (Some(latest), Some(previous)) if previous != 0.0 => {
            let pct = (latest - previous) / previous * 100.0;
            if pct.is_finite() { pct } else { 0.0 }
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rise() {
        let pct = change_percent(d("1.10"), Some(d("1.05")));
        assert!((pct - 4.7619).abs() < 0.001, "got {pct}");
    }

    #[test]
    fn test_fall() {
        let pct = change_percent(d("90"), Some(d("100")));
        assert!((pct + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_previous_is_zero() {
        assert_eq!(change_percent(d("1.10"), None), 0.0);
    }

    #[test]
    fn test_extreme_ratio_does_not_overflow() {
        let tiny = d("0.0000000000000000000000000001");

        let pct = change_percent(d("1"), Some(tiny));
        assert!(pct.is_finite());
        assert!(pct > 1e29, "got {pct}");

        let pct = change_percent(tiny, Some(d("79228162514264337593543950335")));
        assert!((pct + 100.0).abs() < 1e-9, "got {pct}");
    }

    #[test]
    fn test_zero_previous_is_zero() {
        assert_eq!(change_percent(d("1.10"), Some(Decimal::ZERO)), 0.0);
    }
}
