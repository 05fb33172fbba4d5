//! Validating price oracle adapter.
//!
//! Wraps a raw [`PriceSource`] and refuses any reading that is stale, out
//! of the asset's configured bounds, or taken while the sequencer signal is
//! down or inside its post-recovery grace period. Prices are normalized to
//! 18-decimal fixed point using the asset's oracle decimals, looked up per
//! asset and never assumed constant. A rejected read surfaces a distinct
//! error kind; there is no fallback value.

use std::fmt;

use crate::core::asset::AssetParams;
use crate::error::{Error, Result};
use crate::oracle::source::{PriceSource, SequencerOracle, SequencerStatus};
use crate::utils::constants::MAX_DECIMALS;
use crate::utils::math::{mul_div, pow10, safe_mul};

// ═══════════════════════════════════════════════════════════════════════════════
// PURE CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// USD value (WAD) of `amount` native units at a WAD price
pub fn value_at_price(price_wad: u128, amount: u128, token_decimals: u32) -> Result<u128> {
    mul_div(amount, price_wad, pow10(token_decimals))
}

/// Native token units equivalent to a WAD USD value at a WAD price.
/// The result is in the asset's own decimal precision, not 18.
pub fn amount_at_price(price_wad: u128, value_usd_wad: u128, token_decimals: u32) -> Result<u128> {
    mul_div(value_usd_wad, pow10(token_decimals), price_wad)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE ADAPTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Validating adapter over a price source and an optional sequencer signal
pub struct OracleAdapter {
    source: Box<dyn PriceSource>,
    sequencer: Option<Box<dyn SequencerOracle>>,
    grace_secs: u64,
}

impl fmt::Debug for OracleAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleAdapter")
            .field("sequencer", &self.sequencer.is_some())
            .field("grace_secs", &self.grace_secs)
            .finish()
    }
}

impl OracleAdapter {
    /// Create an adapter with no sequencer signal (the liveness
    /// precondition is vacuously satisfied)
    pub fn new(source: Box<dyn PriceSource>) -> Self {
        Self {
            source,
            sequencer: None,
            grace_secs: 0,
        }
    }

    /// Attach a sequencer signal with a post-recovery grace period
    pub fn with_sequencer(mut self, sequencer: Box<dyn SequencerOracle>, grace_secs: u64) -> Self {
        self.sequencer = Some(sequencer);
        self.grace_secs = grace_secs;
        self
    }

    /// Refuse reads while the sequencer is down, and for `grace_secs`
    /// after any reported downtime-recovery transition.
    fn ensure_available(&self, now: u64) -> Result<()> {
        let Some(sequencer) = &self.sequencer else {
            return Ok(());
        };
        match sequencer.status()? {
            SequencerStatus::Down { since } => Err(Error::SequencerUnavailable {
                since,
                grace_secs: self.grace_secs,
            }),
            SequencerStatus::Up { since } => {
                if now.saturating_sub(since) < self.grace_secs {
                    Err(Error::SequencerUnavailable {
                        since,
                        grace_secs: self.grace_secs,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Validated price in 18-decimal fixed point.
    ///
    /// Normalization: `price_raw * 10^(18 - oracle_decimals)`, with the
    /// decimal count taken from the asset's parameters.
    pub fn price_wad(&self, params: &AssetParams, now: u64) -> Result<u128> {
        self.ensure_available(now)?;

        let quote = self.source.latest_quote(&params.id)?;

        let age_secs = now.saturating_sub(quote.timestamp);
        if age_secs > params.stale_after_secs {
            return Err(Error::StalePrice {
                asset: params.id.to_string(),
                age_secs,
                max_age_secs: params.stale_after_secs,
            });
        }

        // A circuit-breaker-frozen feed reports its clamp value as if
        // live, so the bounds themselves are rejected, not just values
        // beyond them.
        if quote.price_raw <= params.min_price_raw || quote.price_raw >= params.max_price_raw {
            return Err(Error::PriceOutOfBounds {
                asset: params.id.to_string(),
                price: quote.price_raw,
                min: params.min_price_raw,
                max: params.max_price_raw,
            });
        }

        tracing::debug!(
            asset = %params.id,
            price_raw = quote.price_raw,
            round_id = quote.round_id,
            age_secs,
            "validated price quote"
        );

        safe_mul(quote.price_raw, pow10(MAX_DECIMALS - params.oracle_decimals))
    }

    /// USD value (WAD) of `amount` native units of the asset, at a fresh
    /// validated price
    pub fn value_in_usd(&self, params: &AssetParams, amount: u128, now: u64) -> Result<u128> {
        let price = self.price_wad(params, now)?;
        value_at_price(price, amount, params.token_decimals)
    }

    /// Native token units equivalent to a WAD USD value, at a fresh
    /// validated price
    pub fn token_amount_from_usd(
        &self,
        params: &AssetParams,
        value_usd_wad: u128,
        now: u64,
    ) -> Result<u128> {
        let price = self.price_wad(params, now)?;
        amount_at_price(price, value_usd_wad, params.token_decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::asset::AssetId;
    use crate::oracle::source::{InMemoryPriceSource, InMemorySequencer};
    use crate::utils::constants::WAD;
    use std::sync::{Arc, RwLock};

    type SharedSource = Arc<RwLock<InMemoryPriceSource>>;
    type SharedSequencer = Arc<RwLock<InMemorySequencer>>;

    fn btc_params() -> AssetParams {
        // 8-decimal token, 8-decimal oracle, bounds $1 .. $10M
        AssetParams::new("WBTC", "WBTC", 8, 8, 1_00000000, 10_000_000_00000000)
            .with_stale_after(3 * 3600)
    }

    fn adapter_with(params: &AssetParams, price_raw: u128, timestamp: u64) -> OracleAdapter {
        let mut source = InMemoryPriceSource::new();
        source.set_quote(params.id.clone(), price_raw, timestamp);
        OracleAdapter::new(Box::new(source))
    }

    #[test]
    fn test_price_normalization_8_decimals() {
        let params = btc_params();
        // $30,000 with 8 oracle decimals
        let adapter = adapter_with(&params, 30_000_00000000, 1000);

        let price = adapter.price_wad(&params, 1000).unwrap();
        assert_eq!(price, 30_000 * WAD);
    }

    #[test]
    fn test_staleness_is_per_asset() {
        let three_hours = btc_params();
        let six_hours = btc_params().with_stale_after(6 * 3600);

        // Quote published 4 hours before the read
        let now = 100_000;
        let published = now - 4 * 3600;
        let adapter = adapter_with(&three_hours, 30_000_00000000, published);

        let err = adapter.price_wad(&three_hours, now).unwrap_err();
        assert!(matches!(err, Error::StalePrice { .. }));

        // The same feed under a 6-hour timeout succeeds
        let adapter = adapter_with(&six_hours, 30_000_00000000, published);
        assert!(adapter.price_wad(&six_hours, now).is_ok());
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let params = btc_params();

        // Exactly the clamp value must be rejected
        let adapter = adapter_with(&params, params.min_price_raw, 1000);
        assert!(matches!(
            adapter.price_wad(&params, 1000),
            Err(Error::PriceOutOfBounds { .. })
        ));

        let adapter = adapter_with(&params, params.max_price_raw, 1000);
        assert!(matches!(
            adapter.price_wad(&params, 1000),
            Err(Error::PriceOutOfBounds { .. })
        ));

        let adapter = adapter_with(&params, params.min_price_raw + 1, 1000);
        assert!(adapter.price_wad(&params, 1000).is_ok());
    }

    #[test]
    fn test_sequencer_down_refuses_reads() {
        let params = btc_params();
        let mut source = InMemoryPriceSource::new();
        source.set_quote(params.id.clone(), 30_000_00000000, 100_000);

        let sequencer: SharedSequencer = Arc::new(RwLock::new(InMemorySequencer::up_since(0)));
        let adapter = OracleAdapter::new(Box::new(source))
            .with_sequencer(Box::new(sequencer.clone()), 3600);

        assert!(adapter.price_wad(&params, 100_000).is_ok());

        sequencer.write().unwrap().set_down(100_100);
        assert!(matches!(
            adapter.price_wad(&params, 100_200),
            Err(Error::SequencerUnavailable { .. })
        ));
    }

    #[test]
    fn test_grace_period_after_recovery() {
        let params = btc_params();
        let now = 200_000;
        let source: SharedSource = Arc::new(RwLock::new(InMemoryPriceSource::new()));
        source
            .write()
            .unwrap()
            .set_quote(params.id.clone(), 30_000_00000000, now);

        let sequencer: SharedSequencer = Arc::new(RwLock::new(InMemorySequencer::up_since(0)));
        let adapter = OracleAdapter::new(Box::new(source.clone()))
            .with_sequencer(Box::new(sequencer.clone()), 3600);

        // Recovered 10 minutes before the read: still inside grace
        sequencer.write().unwrap().set_up(now - 600);
        assert!(matches!(
            adapter.price_wad(&params, now),
            Err(Error::SequencerUnavailable { .. })
        ));

        // Recovered well before the grace window: accepted
        sequencer.write().unwrap().set_up(now - 7200);
        source
            .write()
            .unwrap()
            .set_quote(params.id.clone(), 30_000_00000000, now);
        assert!(adapter.price_wad(&params, now).is_ok());
    }

    #[test]
    fn test_value_in_usd() {
        let params = btc_params();
        let adapter = adapter_with(&params, 30_000_00000000, 1000);

        // 10 WBTC (8 decimals) at $30,000 = $300,000
        let value = adapter.value_in_usd(&params, 10_00000000, 1000).unwrap();
        assert_eq!(value, 300_000 * WAD);
    }

    #[test]
    fn test_round_trip_across_decimal_counts() {
        for (token_decimals, amount) in [(6u32, 123_456_789u128), (8, 5_00000000), (18, 7 * WAD)] {
            let params = AssetParams::new(
                "ASSET",
                "ASSET",
                token_decimals,
                8,
                1_00000000,
                10_000_000_00000000,
            );
            let adapter = adapter_with(&params, 1_234_00000000, 1000);

            let value = adapter.value_in_usd(&params, amount, 1000).unwrap();
            let back = adapter.token_amount_from_usd(&params, value, 1000).unwrap();
            assert!(amount - back <= 1, "round trip drift beyond 1 unit");
        }
    }
}
