//! In-memory `CacheStore` backed by a mutex-guarded map.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::store::CacheStore;

/// Process-local store. Entry expiry lives in the serialized `CacheEntry`,
/// so this map never prunes — the two fixed slots keep it bounded.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let guard = self.inner.lock().map_err(|e| CacheError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(guard.get(key).cloned())
    }

    async fn put_raw(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut guard = self.inner.lock().map_err(|e| CacheError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        guard.insert(key.to_string(), value);
        Ok(())
    }
}
