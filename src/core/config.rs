//! Engine configuration and parameters.
//!
//! Everything that should vary per deployment is configuration resolved at
//! call time: the liquidation threshold, the liquidation bonus, the
//! sequencer grace period, and the dust-position policy. Per-asset values
//! live in the asset registry.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::*;

// ═══════════════════════════════════════════════════════════════════════════════
// DUST POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the minimum-position floor is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DustEnforcement {
    /// Floor disabled
    Off,
    /// Checked when collateral is deposited
    Deposit,
    /// Checked when debt is minted
    Mint,
    /// Checked at both points
    Both,
}

/// Minimum-position policy: positions valued below the floor may be
/// rejected to avoid unliquidatable dust accumulating as latent bad debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustPolicy {
    /// USD floor in WAD; zero disables the check
    pub floor_usd_wad: u128,
    /// Enforcement point
    pub enforce: DustEnforcement,
}

impl Default for DustPolicy {
    fn default() -> Self {
        Self {
            floor_usd_wad: 0,
            enforce: DustEnforcement::Mint,
        }
    }
}

impl DustPolicy {
    /// Whether the floor applies at deposit time
    pub fn applies_at_deposit(&self) -> bool {
        self.floor_usd_wad > 0
            && matches!(self.enforce, DustEnforcement::Deposit | DustEnforcement::Both)
    }

    /// Whether the floor applies at mint time
    pub fn applies_at_mint(&self) -> bool {
        self.floor_usd_wad > 0
            && matches!(self.enforce, DustEnforcement::Mint | DustEnforcement::Both)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Protocol-wide engine parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fraction of collateral face value usable against debt, in basis
    /// points (5000 = 50%, i.e. an effective 200% collateralization)
    pub liquidation_threshold_bps: u64,

    /// Minimum health factor a mutating operation must leave the acting
    /// user with (WAD; 1.0 = break-even)
    pub min_health_factor_wad: u128,

    /// Liquidation bonus paid to liquidators, in basis points
    pub liquidation_bonus_bps: u64,

    /// Grace period after a sequencer downtime-recovery transition during
    /// which all price reads are refused
    pub sequencer_grace_secs: u64,

    /// Minimum-position policy
    pub dust_policy: DustPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            liquidation_threshold_bps: DEFAULT_LIQUIDATION_THRESHOLD_BPS,
            min_health_factor_wad: DEFAULT_MIN_HEALTH_FACTOR_WAD,
            liquidation_bonus_bps: DEFAULT_LIQUIDATION_BONUS_BPS,
            sequencer_grace_secs: DEFAULT_SEQUENCER_GRACE_SECS,
            dust_policy: DustPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Override the liquidation threshold (for testing)
    pub fn with_threshold_bps(mut self, bps: u64) -> Self {
        self.liquidation_threshold_bps = bps;
        self
    }

    /// Override the liquidation bonus (for testing)
    pub fn with_bonus_bps(mut self, bps: u64) -> Self {
        self.liquidation_bonus_bps = bps;
        self
    }

    /// Validate parameters are consistent
    pub fn validate(&self) -> Result<()> {
        if self.liquidation_threshold_bps == 0 || self.liquidation_threshold_bps > BPS_DIVISOR {
            return Err(Error::InvalidParameter {
                name: "liquidation_threshold_bps".into(),
                reason: format!(
                    "{} must be in (0, {}]",
                    self.liquidation_threshold_bps, BPS_DIVISOR
                ),
            });
        }
        if self.liquidation_bonus_bps >= BPS_DIVISOR {
            return Err(Error::InvalidParameter {
                name: "liquidation_bonus_bps".into(),
                reason: format!("{} must be below {}", self.liquidation_bonus_bps, BPS_DIVISOR),
            });
        }
        if self.min_health_factor_wad < WAD {
            return Err(Error::InvalidParameter {
                name: "min_health_factor_wad".into(),
                reason: "must be at least 1.0 (WAD)".into(),
            });
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Load from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
