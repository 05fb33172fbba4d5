//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and
//! modification. Per-asset values (decimals, staleness timeouts, price
//! bounds) are configuration, not constants — see [`crate::core::asset`].

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED-POINT CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// WAD scale: 18-decimal fixed point (1.0 = 10^18)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Basis points divisor (10000 = 100%)
pub const BPS_DIVISOR: u64 = 10_000;

/// Maximum decimal precision supported for assets and oracles
pub const MAX_DECIMALS: u32 = 18;

// ═══════════════════════════════════════════════════════════════════════════════
// DSC CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// DSC decimals: the pegged unit is 18-decimal fixed point
pub const DSC_DECIMALS: u32 = 18;

/// DSC token symbol
pub const DSC_SYMBOL: &str = "DSC";

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERALIZATION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default liquidation threshold — 50% of face value is usable,
/// yielding an effective 200% collateralization requirement
pub const DEFAULT_LIQUIDATION_THRESHOLD_BPS: u64 = 5_000;

/// Default minimum health factor (1.0 in WAD)
pub const DEFAULT_MIN_HEALTH_FACTOR_WAD: u128 = WAD;

/// Default liquidation bonus — 10% (1000 basis points)
pub const DEFAULT_LIQUIDATION_BONUS_BPS: u64 = 1_000;

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default staleness timeout applied to a newly registered asset when the
/// registrar does not override it (3 hours)
pub const DEFAULT_STALE_AFTER_SECS: u64 = 3 * 3600;

/// Default grace period after a sequencer recovery before price reads
/// are accepted again (1 hour)
pub const DEFAULT_SEQUENCER_GRACE_SECS: u64 = 3600;
