//! Core modules for the DSC engine.
//!
//! This module contains the fundamental building blocks:
//! - Account and asset identifiers
//! - Asset registry with per-asset oracle parameters
//! - Collateral and debt bookkeeping
//! - Fungible token ledgers with capability-gated issuance
//! - Engine configuration

pub mod account;
pub mod asset;
pub mod config;
pub mod ledger;
pub mod token;

pub use account::*;
pub use asset::*;
pub use config::*;
pub use ledger::*;
pub use token::*;
