// src/cache.rs
//! Content-addressed response cache with per-entry expiry.
//!
//! The store is deliberately dumb: `get` returns whatever is present,
//! expired or not, and the caller decides. A store failure is never a
//! request failure — callers treat it as a miss and take the fetch path.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deterministic cache key from normalized request parts: each part is
/// trimmed and lowercased, parts are joined with a unit separator so that
/// `("ab", "c")` and `("a", "bc")` cannot collide, then SHA-256 hex.
pub fn request_key(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("\x1f");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Key-value persistence seam. The production deployment would back this
/// with the document database; this build ships the in-memory store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;
    async fn put(&self, key: &str, payload: Value, ttl: std::time::Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Process-local store: a `RwLock<HashMap>` with upsert-on-put semantics.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let guard = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, payload: Value, ttl: std::time::Duration) -> Result<()> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(ttl)?;
        let entry = CacheEntry {
            payload,
            created_at: now,
            expires_at: now + ttl,
        };
        let mut guard = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        guard.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        guard.remove(key);
        Ok(())
    }
}

/// Read-side of the miss/hit state machine: returns the live payload, and
/// lazily deletes an entry found expired. Store errors degrade to a miss.
pub async fn lookup_live(store: &dyn CacheStore, key: &str) -> Option<Value> {
    match store.get(key).await {
        Ok(Some(entry)) => {
            if entry.is_expired_at(Utc::now()) {
                if let Err(e) = store.delete(key).await {
                    tracing::warn!(error = ?e, key, "failed to drop expired cache entry");
                }
                metrics::counter!("cache_misses_total").increment(1);
                None
            } else {
                metrics::counter!("cache_hits_total").increment(1);
                Some(entry.payload)
            }
        }
        Ok(None) => {
            metrics::counter!("cache_misses_total").increment(1);
            None
        }
        Err(e) => {
            tracing::warn!(error = ?e, key, "cache read failed; treating as miss");
            metrics::counter!("cache_misses_total").increment(1);
            None
        }
    }
}

/// Write-side: one upsert per miss. Failure is logged, never surfaced.
pub async fn store_result(
    store: &dyn CacheStore,
    key: &str,
    payload: &Value,
    ttl: std::time::Duration,
) {
    if let Err(e) = store.put(key, payload.clone(), ttl).await {
        tracing::warn!(error = ?e, key, "cache write failed; continuing without cache");
    }
}
