//! # DSC Engine
//!
//! A collateralized-debt engine that issues a USD-pegged accounting unit
//! (DSC) against deposited crypto collateral and liquidates
//! under-collateralized positions to keep the unit solvent and
//! over-collateralized at all times.
//!
//! ## Architecture
//!
//! - **Core**: account/asset identifiers, asset registry, collateral and
//!   debt bookkeeping, capability-gated token ledgers, configuration
//! - **Oracle**: price source abstraction and a validating adapter
//!   (decimal normalization, staleness, bounds, sequencer liveness)
//! - **Engine**: the governing state machine and the pure health-factor
//!   calculator
//! - **Liquidation**: bonus-adjusted, clamped liquidation planning and
//!   records
//! - **Storage**: state snapshots behind a backend trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use dsc_engine::prelude::*;
//!
//! let mut engine = DscEngine::new(EngineConfig::default(), engine_id, source)?;
//! engine.register_asset(weth_params, issuer)?;
//! engine.deposit_and_mint(user, weth, collateral, dsc_amount, now)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod engine;
pub mod error;
pub mod liquidation;
pub mod oracle;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        account::AccountId,
        asset::{AssetId, AssetParams, AssetRegistry},
        config::{DustEnforcement, DustPolicy, EngineConfig},
        ledger::CollateralLedger,
        token::TokenLedger,
    };
    pub use crate::engine::{
        health::{health_factor, HealthFactor},
        DscEngine, EngineState, EngineStatistics,
    };
    pub use crate::error::{Error, Result};
    pub use crate::liquidation::{LiquidationEvent, LiquidationPlan};
    pub use crate::oracle::{
        adapter::OracleAdapter,
        source::{InMemoryPriceSource, InMemorySequencer, PriceQuote, PriceSource, SequencerOracle},
    };
    pub use crate::utils::constants::WAD;
}

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name
pub const PROTOCOL_NAME: &str = "DSC";
