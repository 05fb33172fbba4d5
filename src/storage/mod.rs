//! Engine state persistence.
//!
//! Snapshots serialize the complete [`EngineState`] with bincode behind a
//! small key-value backend trait. The in-memory backend serves tests and
//! embedders that bring their own durability.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::engine::EngineState;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key under which the engine snapshot is stored
pub const STATE_KEY: &[u8] = b"engine/state";

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key, returning whether it existed
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool>;
}

/// Persist an engine state snapshot
pub fn save_state(backend: &dyn StorageBackend, state: &EngineState) -> Result<()> {
    let bytes = bincode::serialize(state).map_err(|e| Error::Serialization(e.to_string()))?;
    backend.set(STATE_KEY, &bytes)
}

/// Load a previously persisted engine state snapshot
pub fn load_state(backend: &dyn StorageBackend) -> Result<Option<EngineState>> {
    match backend.get(STATE_KEY)? {
        Some(bytes) => {
            let state =
                bincode::deserialize(&bytes).map_err(|e| Error::Deserialization(e.to_string()))?;
            Ok(Some(state))
        }
        None => Ok(None),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend (for testing and ephemeral use)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let data = self.data.read().map_err(|_| Error::Lock)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut data = self.data.write().map_err(|_| Error::Lock)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut data = self.data.write().map_err(|_| Error::Lock)?;
        Ok(data.remove(key).is_some())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let data = self.data.read().map_err(|_| Error::Lock)?;
        Ok(data.contains_key(key))
    }
}
