//! Key-value cache store — injected dependency, best-effort by contract.
//!
//! Two fixed slots exist: one for the fetched-email set, one for the
//! verdict set. Values are full JSON arrays wrapped in a `CacheEntry`
//! carrying their own expiry; the TTL is reapplied on every write.
//!
//! Cache failures are logged and treated as misses — they never propagate
//! out of the typed helpers.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Slot key for the fetched-email set.
pub const EMAIL_CACHE_KEY: &str = "triage:emails";
/// Slot key for the classification-verdict set.
pub const VERDICT_CACHE_KEY: &str = "triage:verdicts";

/// A cached value with its write time and time-to-live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl_secs: u64) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
            ttl_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.stored_at + chrono::Duration::seconds(self.ttl_secs as i64)
    }
}

/// Backend-agnostic string key-value store.
///
/// Slots are read/write but not transactional — concurrent writers race
/// last-writer-wins, which the cache contract accepts.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn put_raw(&self, key: &str, value: String) -> Result<(), CacheError>;
}

/// Typed read. Expired entries, parse failures, and store errors all
/// surface as `None`; errors are logged here and go no further.
pub async fn cache_get<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<T> {
    let raw = match store.get_raw(key).await {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "Cache read failed; treating as miss");
            return None;
        }
    };

    let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(key, error = %e, "Cache entry undecodable; treating as miss");
            return None;
        }
    };

    if entry.is_expired() {
        tracing::debug!(key, "Cache entry expired");
        return None;
    }

    Some(entry.value)
}

/// Typed write with a fresh TTL. Failures are logged only.
pub async fn cache_put<T: Serialize>(store: &dyn CacheStore, key: &str, value: &T, ttl_secs: u64) {
    let entry = CacheEntry::new(value, ttl_secs);
    let raw = match serde_json::to_string(&entry) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "Cache entry unserializable; skipping write");
            return;
        }
    };

    if let Err(e) = store.put_raw(key, raw).await {
        tracing::warn!(key, error = %e, "Cache write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_typed_values() {
        let store = MemoryStore::new();
        cache_put(&store, "k", &vec![1, 2, 3], 60).await;
        let value: Option<Vec<i32>> = cache_get(&store, "k").await;
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn absent_key_is_none() {
        let store = MemoryStore::new();
        let value: Option<Vec<i32>> = cache_get(&store, "missing").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let store = MemoryStore::new();
        let entry = CacheEntry {
            value: vec![1],
            stored_at: Utc::now() - chrono::Duration::seconds(120),
            ttl_secs: 60,
        };
        store
            .put_raw("k", serde_json::to_string(&entry).unwrap())
            .await
            .unwrap();

        let value: Option<Vec<i32>> = cache_get(&store, "k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let store = MemoryStore::new();
        store.put_raw("k", "not json".to_string()).await.unwrap();
        let value: Option<Vec<i32>> = cache_get(&store, "k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn rewrite_refreshes_ttl() {
        let store = MemoryStore::new();
        cache_put(&store, "k", &"v1".to_string(), 60).await;
        cache_put(&store, "k", &"v2".to_string(), 60).await;
        let value: Option<String> = cache_get(&store, "k").await;
        assert_eq!(value.as_deref(), Some("v2"));
    }
}
