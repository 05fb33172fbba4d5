//! Error types for the DSC engine.
//!
//! Every fallible operation in the crate surfaces one of these variants.
//! Mutating engine operations are all-or-nothing: any error leaves the
//! engine state exactly as it was before the call.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the DSC engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Asset Registry Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Asset is not registered with the engine
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    /// Asset identifier already registered
    #[error("duplicate asset registration: {0}")]
    DuplicateAsset(String),

    // ═══════════════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Redemption or seizure exceeds the deposited position
    #[error("insufficient collateral: required {required}, available {available}")]
    InsufficientCollateral {
        /// Collateral amount required, in asset native units
        required: u128,
        /// Collateral amount available, in asset native units
        available: u128,
    },

    /// Burn or repayment exceeds the outstanding debt
    #[error("insufficient debt: requested {requested}, outstanding {outstanding}")]
    InsufficientDebt {
        /// Amount requested to burn or repay
        requested: u128,
        /// Outstanding debt balance
        outstanding: u128,
    },

    /// Token balance too low for the requested transfer or burn
    #[error("insufficient {token} balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Token symbol
        token: String,
        /// Amount required
        required: u128,
        /// Amount available
        available: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Health Factor Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Operation would leave the acting user below the minimum health factor
    #[error("health factor {health_factor} below required {minimum}")]
    HealthFactorBroken {
        /// Health factor after the would-be operation (WAD)
        health_factor: u128,
        /// Required health factor (WAD)
        minimum: u128,
    },

    /// Liquidation attempted against a user who is not liquidatable
    #[error("health factor {health_factor} is not below liquidation threshold")]
    HealthFactorOk {
        /// The target's current health factor (WAD)
        health_factor: u128,
    },

    /// Operation would leave a position below the configured USD floor
    #[error("position value {value_usd} below minimum {floor_usd}")]
    PositionBelowMinimum {
        /// Position value in USD (WAD)
        value_usd: u128,
        /// Configured floor in USD (WAD)
        floor_usd: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Oracle Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Price quote is older than the asset's staleness timeout
    #[error("stale price for {asset}: age {age_secs}s, max allowed {max_age_secs}s")]
    StalePrice {
        /// Asset identifier
        asset: String,
        /// Seconds since the quote was published
        age_secs: u64,
        /// Configured maximum age for this asset
        max_age_secs: u64,
    },

    /// Price is at or beyond the configured bounds for the asset
    #[error("price {price} for {asset} out of bounds ({min}, {max})")]
    PriceOutOfBounds {
        /// Asset identifier
        asset: String,
        /// Reported raw price
        price: u128,
        /// Configured minimum (exclusive)
        min: u128,
        /// Configured maximum (exclusive)
        max: u128,
    },

    /// Sequencer is down, or recovered too recently to trust price reads
    #[error("sequencer unavailable since {since} (grace period {grace_secs}s)")]
    SequencerUnavailable {
        /// Timestamp of the down transition, or of the recovery
        since: u64,
        /// Configured grace period after recovery
        grace_secs: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Caller does not hold the required capability
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// An operation re-entered the engine before the previous one finished
    #[error("re-entrant call rejected during {operation}")]
    Reentrant {
        /// The operation that was in flight
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Amount is zero where a positive amount is required
    #[error("amount cannot be zero")]
    InvalidAmount,

    /// Invalid input or configuration parameter
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Overflow in calculation
    #[error("arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Serialization / Storage Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Lock acquisition failed
    #[error("failed to acquire lock")]
    Lock,
}

impl Error {
    /// Returns true if the caller can retry once conditions change
    /// (more collateral, fresher price, smaller amount).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientCollateral { .. }
                | Error::InsufficientDebt { .. }
                | Error::InsufficientBalance { .. }
                | Error::HealthFactorBroken { .. }
                | Error::PositionBelowMinimum { .. }
                | Error::StalePrice { .. }
                | Error::SequencerUnavailable { .. }
        )
    }

    /// Returns true if this error indicates no valid price is available now.
    /// Callers must abort the enclosing operation; there is no fallback price.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(
            self,
            Error::StalePrice { .. }
                | Error::PriceOutOfBounds { .. }
                | Error::SequencerUnavailable { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Asset registry errors: 1xxx
            Error::UnknownAsset(_) => 1001,
            Error::DuplicateAsset(_) => 1002,

            // Ledger errors: 2xxx
            Error::InsufficientCollateral { .. } => 2001,
            Error::InsufficientDebt { .. } => 2002,
            Error::InsufficientBalance { .. } => 2003,

            // Health factor errors: 3xxx
            Error::HealthFactorBroken { .. } => 3001,
            Error::HealthFactorOk { .. } => 3002,
            Error::PositionBelowMinimum { .. } => 3003,

            // Oracle errors: 4xxx
            Error::StalePrice { .. } => 4001,
            Error::PriceOutOfBounds { .. } => 4002,
            Error::SequencerUnavailable { .. } => 4003,

            // Authorization errors: 5xxx
            Error::Unauthorized(_) => 5001,
            Error::Reentrant { .. } => 5002,

            // Validation errors: 6xxx
            Error::InvalidAmount => 6001,
            Error::InvalidParameter { .. } => 6002,
            Error::Overflow { .. } => 6003,

            // Serialization / storage errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,
            Error::Storage(_) => 7003,
            Error::Lock => 7004,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        let codes = vec![
            Error::UnknownAsset("".into()).code(),
            Error::DuplicateAsset("".into()).code(),
            Error::InsufficientCollateral { required: 0, available: 0 }.code(),
            Error::InsufficientDebt { requested: 0, outstanding: 0 }.code(),
            Error::InsufficientBalance { token: "".into(), required: 0, available: 0 }.code(),
            Error::HealthFactorBroken { health_factor: 0, minimum: 0 }.code(),
            Error::HealthFactorOk { health_factor: 0 }.code(),
            Error::PositionBelowMinimum { value_usd: 0, floor_usd: 0 }.code(),
            Error::StalePrice { asset: "".into(), age_secs: 0, max_age_secs: 0 }.code(),
            Error::PriceOutOfBounds { asset: "".into(), price: 0, min: 0, max: 0 }.code(),
            Error::SequencerUnavailable { since: 0, grace_secs: 0 }.code(),
            Error::Unauthorized("".into()).code(),
            Error::Reentrant { operation: "".into() }.code(),
            Error::InvalidAmount.code(),
            Error::Overflow { operation: "".into() }.code(),
        ];

        let mut unique = codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(codes.len(), unique.len(), "error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientCollateral {
            required: 1000,
            available: 500,
        };
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_oracle_failures_grouped() {
        assert!(Error::StalePrice { asset: "WETH".into(), age_secs: 0, max_age_secs: 0 }
            .is_oracle_failure());
        assert!(Error::PriceOutOfBounds { asset: "WETH".into(), price: 0, min: 0, max: 0 }
            .is_oracle_failure());
        assert!(Error::SequencerUnavailable { since: 0, grace_secs: 0 }.is_oracle_failure());
        assert!(!Error::InvalidAmount.is_oracle_failure());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::HealthFactorBroken { health_factor: 0, minimum: 0 }.is_recoverable());
        assert!(Error::StalePrice { asset: "".into(), age_secs: 0, max_age_secs: 0 }
            .is_recoverable());
        assert!(!Error::DuplicateAsset("WETH".into()).is_recoverable());
    }
}
