//! Collateral asset registry.
//!
//! Each admitted collateral asset carries its own oracle decimals, token
//! decimals, staleness timeout, and price bounds. The registry is keyed by
//! asset identifier, so a second registration of the same identifier fails
//! instead of silently double-counting valuations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::constants::{DEFAULT_STALE_AFTER_SECS, MAX_DECIMALS};

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Collateral asset identifier (symbol-like, e.g. `"WETH"`, `"WBTC"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new asset identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-asset configuration, resolved at call time on every valuation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    /// Asset identifier
    pub id: AssetId,
    /// Token symbol used on the asset's fungible ledger
    pub symbol: String,
    /// Decimal precision of the asset's own unit
    pub token_decimals: u32,
    /// Decimal precision of the oracle's native price unit
    pub oracle_decimals: u32,
    /// Maximum quote age before the price is considered stale, in seconds.
    /// Update cadence varies by source, so this is per asset.
    pub stale_after_secs: u64,
    /// Minimum sane raw price (exclusive); quotes at or below are rejected
    pub min_price_raw: u128,
    /// Maximum sane raw price (exclusive); quotes at or above are rejected
    pub max_price_raw: u128,
}

impl AssetParams {
    /// Create parameters with the default staleness timeout
    pub fn new(
        id: impl Into<AssetId>,
        symbol: impl Into<String>,
        token_decimals: u32,
        oracle_decimals: u32,
        min_price_raw: u128,
        max_price_raw: u128,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            token_decimals,
            oracle_decimals,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
            min_price_raw,
            max_price_raw,
        }
    }

    /// Override the staleness timeout
    pub fn with_stale_after(mut self, secs: u64) -> Self {
        self.stale_after_secs = secs;
        self
    }

    /// Validate internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.token_decimals > MAX_DECIMALS {
            return Err(Error::InvalidParameter {
                name: "token_decimals".into(),
                reason: format!("{} exceeds maximum {}", self.token_decimals, MAX_DECIMALS),
            });
        }
        if self.oracle_decimals > MAX_DECIMALS {
            return Err(Error::InvalidParameter {
                name: "oracle_decimals".into(),
                reason: format!("{} exceeds maximum {}", self.oracle_decimals, MAX_DECIMALS),
            });
        }
        if self.min_price_raw >= self.max_price_raw {
            return Err(Error::InvalidParameter {
                name: "price_bounds".into(),
                reason: format!(
                    "min {} must be below max {}",
                    self.min_price_raw, self.max_price_raw
                ),
            });
        }
        if self.stale_after_secs == 0 {
            return Err(Error::InvalidParameter {
                name: "stale_after_secs".into(),
                reason: "cannot be zero".into(),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Registry of admitted collateral assets, keyed by identifier.
///
/// A map keyed by id (not a list) makes double-registration impossible by
/// construction: each asset contributes to a user's collateral value at
/// most once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: BTreeMap<AssetId, AssetParams>,
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new asset; rejects duplicate identifiers
    pub fn register(&mut self, params: AssetParams) -> Result<()> {
        params.validate()?;
        if self.assets.contains_key(&params.id) {
            return Err(Error::DuplicateAsset(params.id.to_string()));
        }
        self.assets.insert(params.id.clone(), params);
        Ok(())
    }

    /// Look up an asset's parameters
    pub fn get(&self, id: &AssetId) -> Result<&AssetParams> {
        self.assets
            .get(id)
            .ok_or_else(|| Error::UnknownAsset(id.to_string()))
    }

    /// Update the staleness timeout for a registered asset
    pub fn set_stale_after(&mut self, id: &AssetId, secs: u64) -> Result<()> {
        if secs == 0 {
            return Err(Error::InvalidParameter {
                name: "stale_after_secs".into(),
                reason: "cannot be zero".into(),
            });
        }
        let params = self
            .assets
            .get_mut(id)
            .ok_or_else(|| Error::UnknownAsset(id.to_string()))?;
        params.stale_after_secs = secs;
        Ok(())
    }

    /// Iterate over registered assets in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &AssetParams> {
        self.assets.values()
    }

    /// Number of registered assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether no assets are registered
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
