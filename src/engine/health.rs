//! Health factor calculation.
//!
//! Pure function from (collateral value, debt value) to a solvency ratio.
//! Every mutating engine operation uses it as a precondition or
//! postcondition; it never touches state itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::utils::constants::WAD;
use crate::utils::math::{bps_of, mul_div};

// ═══════════════════════════════════════════════════════════════════════════════
// HEALTH FACTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Solvency ratio in 18-decimal fixed point; 1.0 = break-even.
/// A user with no debt has the maximal value and can never be liquidated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct HealthFactor(u128);

impl HealthFactor {
    /// Maximal health factor (no debt)
    pub const MAX: Self = Self(u128::MAX);

    /// Break-even (1.0)
    pub const ONE: Self = Self(WAD);

    /// Wrap a WAD ratio
    pub const fn from_wad(wad: u128) -> Self {
        Self(wad)
    }

    /// The ratio as a WAD value
    pub const fn wad(&self) -> u128 {
        self.0
    }

    /// Whether this ratio is below the given minimum (an operation leaving
    /// the acting user here must fail; a target here is liquidatable)
    pub fn is_below(&self, minimum_wad: u128) -> bool {
        self.0 < minimum_wad
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::MAX {
            return f.write_str("unbounded");
        }
        match i128::try_from(self.0)
            .ok()
            .and_then(|v| Decimal::try_from_i128_with_scale(v, 18).ok())
        {
            Some(d) => write!(f, "{}", d.normalize()),
            None => write!(f, "{} (wad)", self.0),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALCULATION
// ═══════════════════════════════════════════════════════════════════════════════

/// `(collateral_value_usd * threshold) / debt_value_usd`, both values WAD.
///
/// `threshold_bps` is the usable fraction of collateral face value
/// (5000 = 50%, i.e. 200% effective collateralization).
pub fn health_factor(
    collateral_value_usd: u128,
    debt_value_usd: u128,
    threshold_bps: u64,
) -> Result<HealthFactor> {
    if debt_value_usd == 0 {
        return Ok(HealthFactor::MAX);
    }
    let adjusted = bps_of(collateral_value_usd, threshold_bps)?;
    Ok(HealthFactor::from_wad(mul_div(adjusted, WAD, debt_value_usd)?))
}
