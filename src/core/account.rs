//! Account identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Length of an account identifier in bytes
pub const ACCOUNT_ID_LENGTH: usize = 32;

/// Opaque 32-byte account identifier.
///
/// The engine itself holds an `AccountId`: it is the custodian of deposited
/// collateral and the sole authorized mint/burn caller on the DSC ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Hex-encode the identifier
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidParameter {
            name: "account_id".into(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; ACCOUNT_ID_LENGTH] =
            bytes.try_into().map_err(|_| Error::InvalidParameter {
                name: "account_id".into(),
                reason: format!("expected {} bytes", ACCOUNT_ID_LENGTH),
            })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Abbreviated form for logs; use to_hex() for the full id
        write!(f, "{}…", &self.to_hex()[..8])
    }
}
