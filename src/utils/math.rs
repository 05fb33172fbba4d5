//! Checked fixed-point arithmetic.
//!
//! Monetary values are `u128` in 18-decimal fixed point (WAD). Products of
//! two WAD values exceed `u128`, so multiply-then-divide widens through
//! `U256` and errors on a final result that does not fit back.

use primitive_types::U256;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::utils::constants::BPS_DIVISOR;

// ═══════════════════════════════════════════════════════════════════════════════
// SAFE ARITHMETIC OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or_else(|| Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or_else(|| Error::Overflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Safe multiplication with overflow check
pub fn safe_mul(a: u128, b: u128) -> Result<u128> {
    a.checked_mul(b).ok_or_else(|| Error::Overflow {
        operation: format!("{} * {}", a, b),
    })
}

/// Computes `(a * b) / c` with a 256-bit intermediate, rounding down
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    let result = U256::from(a) * U256::from(b) / U256::from(c);
    if result > U256::from(u128::MAX) {
        return Err(Error::Overflow {
            operation: format!("({} * {}) / {}", a, b, c),
        });
    }
    Ok(result.as_u128())
}

/// Computes `(a * b) / c` with a 256-bit intermediate, rounding up
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    let c = U256::from(c);
    let numerator = U256::from(a) * U256::from(b);
    let result = (numerator + c - U256::one()) / c;
    if result > U256::from(u128::MAX) {
        return Err(Error::Overflow {
            operation: format!("ceil(({} * {}) / {})", a, b, c),
        });
    }
    Ok(result.as_u128())
}

// ═══════════════════════════════════════════════════════════════════════════════
// BASIS POINTS AND DECIMAL SCALING
// ═══════════════════════════════════════════════════════════════════════════════

/// Fraction of `amount` expressed in basis points (100 bps = 1%)
pub fn bps_of(amount: u128, bps: u64) -> Result<u128> {
    mul_div(amount, bps as u128, BPS_DIVISOR as u128)
}

/// `10^exp` as u128; `exp` must be ≤ 38
pub fn pow10(exp: u32) -> u128 {
    10u128.pow(exp)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPLAY HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Formats a WAD USD value as a human-readable decimal string for logs.
/// Values beyond `Decimal` range fall back to the raw integer.
pub fn format_usd(value_wad: u128) -> String {
    match i128::try_from(value_wad)
        .ok()
        .and_then(|v| Decimal::try_from_i128_with_scale(v, 18).ok())
    {
        Some(d) => format!("${}", d.normalize()),
        None => format!("{} (wad)", value_wad),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::WAD;

    #[test]
    fn test_safe_arithmetic() {
        assert!(safe_add(1, 2).is_ok());
        assert!(safe_add(u128::MAX, 1).is_err());

        assert!(safe_sub(5, 3).is_ok());
        assert!(safe_sub(3, 5).is_err());
    }

    #[test]
    fn test_mul_div_widens() {
        // (2^127 * 4) / 8 fits u128 but the intermediate does not
        let a = 1u128 << 127;
        assert_eq!(mul_div(a, 4, 8).unwrap(), a / 2);
    }

    #[test]
    fn test_mul_div_by_zero() {
        assert!(mul_div(1, 1, 0).is_err());
        assert!(mul_div_up(1, 1, 0).is_err());
    }

    #[test]
    fn test_mul_div_overflow() {
        assert!(mul_div(u128::MAX, u128::MAX, 1).is_err());
    }

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div_up(10, 1, 3).unwrap(), 4);
        assert_eq!(mul_div_up(9, 1, 3).unwrap(), 3);
    }

    #[test]
    fn test_bps_of() {
        // 10% of 1.0 WAD
        assert_eq!(bps_of(WAD, 1_000).unwrap(), WAD / 10);
        // 50% of 200
        assert_eq!(bps_of(200, 5_000).unwrap(), 100);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(WAD), "$1");
        assert_eq!(format_usd(WAD * 3 / 2), "$1.5");
    }
}
