//! Price source and sequencer liveness abstractions.
//!
//! The external price-feed wire protocol is out of scope; a source is an
//! abstract capability: "read latest price, timestamp, round id for a given
//! asset". In-memory implementations serve tests and embedders that push
//! prices from their own feed plumbing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::core::asset::AssetId;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE QUOTE
// ═══════════════════════════════════════════════════════════════════════════════

/// A single raw price reading. Ephemeral: read fresh on every valuation,
/// never cached across calls that could observe state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price in the oracle's native decimal precision
    pub price_raw: u128,
    /// Unix timestamp when the price was published
    pub timestamp: u64,
    /// Monotonic round identifier from the source
    pub round_id: u64,
}

/// Source of raw price quotes per asset
pub trait PriceSource: Send + Sync {
    /// Latest quote for an asset; errors if the source has no feed for it
    fn latest_quote(&self, asset: &AssetId) -> Result<PriceQuote>;
}

impl<S: PriceSource> PriceSource for Arc<RwLock<S>> {
    fn latest_quote(&self, asset: &AssetId) -> Result<PriceQuote> {
        self.read().map_err(|_| Error::Lock)?.latest_quote(asset)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY PRICE SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Price source backed by a map, fed by `set_quote`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryPriceSource {
    quotes: BTreeMap<AssetId, PriceQuote>,
    next_round: u64,
}

impl InMemoryPriceSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new quote for an asset
    pub fn set_quote(&mut self, asset: AssetId, price_raw: u128, timestamp: u64) {
        self.next_round += 1;
        self.quotes.insert(
            asset,
            PriceQuote {
                price_raw,
                timestamp,
                round_id: self.next_round,
            },
        );
    }
}

impl PriceSource for InMemoryPriceSource {
    fn latest_quote(&self, asset: &AssetId) -> Result<PriceQuote> {
        self.quotes
            .get(asset)
            .copied()
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEQUENCER LIVENESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Availability of the external sequencing/ordering layer.
///
/// `since` is the timestamp of the most recent status transition: for `Up`,
/// the downtime-recovery (or startup) time — price reads stay refused for a
/// grace period after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerStatus {
    /// Sequencer operating normally since the given timestamp
    Up {
        /// Recovery or startup timestamp
        since: u64,
    },
    /// Sequencer down since the given timestamp
    Down {
        /// Downtime start timestamp
        since: u64,
    },
}

/// External chain/environment liveness signal
pub trait SequencerOracle: Send + Sync {
    /// Current sequencer status
    fn status(&self) -> Result<SequencerStatus>;
}

impl<S: SequencerOracle> SequencerOracle for Arc<RwLock<S>> {
    fn status(&self) -> Result<SequencerStatus> {
        self.read().map_err(|_| Error::Lock)?.status()
    }
}

/// Sequencer signal backed by a settable status
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InMemorySequencer {
    status: SequencerStatus,
}

impl InMemorySequencer {
    /// Create a sequencer reported up since the given timestamp
    pub fn up_since(since: u64) -> Self {
        Self {
            status: SequencerStatus::Up { since },
        }
    }

    /// Report the sequencer down as of the given timestamp
    pub fn set_down(&mut self, since: u64) {
        self.status = SequencerStatus::Down { since };
    }

    /// Report the sequencer recovered as of the given timestamp
    pub fn set_up(&mut self, since: u64) {
        self.status = SequencerStatus::Up { since };
    }
}

impl SequencerOracle for InMemorySequencer {
    fn status(&self) -> Result<SequencerStatus> {
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_quote_and_read() {
        let mut source = InMemoryPriceSource::new();
        let weth = AssetId::new("WETH");
        source.set_quote(weth.clone(), 3_000_00000000, 1000);

        let quote = source.latest_quote(&weth).unwrap();
        assert_eq!(quote.price_raw, 3_000_00000000);
        assert_eq!(quote.timestamp, 1000);
        assert_eq!(quote.round_id, 1);
    }

    #[test]
    fn test_round_id_increments() {
        let mut source = InMemoryPriceSource::new();
        let weth = AssetId::new("WETH");
        source.set_quote(weth.clone(), 100, 1000);
        source.set_quote(weth.clone(), 101, 1001);

        assert_eq!(source.latest_quote(&weth).unwrap().round_id, 2);
    }

    #[test]
    fn test_missing_feed() {
        let source = InMemoryPriceSource::new();
        assert!(matches!(
            source.latest_quote(&AssetId::new("WBTC")),
            Err(Error::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_shared_source_handle() {
        let source = Arc::new(RwLock::new(InMemoryPriceSource::new()));
        let weth = AssetId::new("WETH");

        source.write().unwrap().set_quote(weth.clone(), 42, 7);
        assert_eq!(source.latest_quote(&weth).unwrap().price_raw, 42);
    }

    #[test]
    fn test_sequencer_transitions() {
        let mut sequencer = InMemorySequencer::up_since(0);
        assert_eq!(
            sequencer.status().unwrap(),
            SequencerStatus::Up { since: 0 }
        );

        sequencer.set_down(500);
        assert_eq!(
            sequencer.status().unwrap(),
            SequencerStatus::Down { since: 500 }
        );

        sequencer.set_up(900);
        assert_eq!(
            sequencer.status().unwrap(),
            SequencerStatus::Up { since: 900 }
        );
    }
}
