//! TTL cache for aggregate results
//!
//! Every expensive aggregate in the engine sits behind one of these stores.
//! Entries hold the JSON form of the cached value: a payload that no longer
//! deserializes into the requested type (after a schema change, say) reads as
//! a miss, not an error.
//!
//! ## Key Grammar
//!
//! Keys are namespaced strings of the form `<domain>-<account>[-<subkey>]`,
//! lowercase domain tokens, account id as the primary partition. Entries are
//! never shared across accounts.
//!
//! ## Clock Injection
//!
//! Expiry is computed against an injected [`Clock`], so TTL behavior is
//! testable with a [`ManualClock`] instead of sleeping.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::Result;
use cumulo_core::AccountId;

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall-clock time source used outside tests
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced time source for deterministic TTL tests
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Advance the clock by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + *offset
    }
}

/// Build a cache key from the `<domain>-<account>[-<subkey>]` grammar
pub fn cache_key(domain: &str, account: &AccountId, subkey: Option<&str>) -> String {
    match subkey {
        Some(sub) => format!("{}-{}-{}", domain, account, sub),
        None => format!("{}-{}", domain, account),
    }
}

struct CacheEntry {
    value: serde_json::Value,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}

/// Typed key/value store with per-entry TTL and explicit eviction.
///
/// The store is the only piece of mutable shared state in the engine.
/// Reads and writes for one key are linearizable through the lock; readers
/// observe either the old or the new value, never a torn one.
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Create a store on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store on an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Fetch a typed value.
    ///
    /// Returns `None` if the key is absent, the entry has outlived its TTL,
    /// or the stored payload no longer deserializes into `T`. The
    /// undeserializable case is also evicted so the next read does not pay
    /// for the same failed parse.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let entries = self.entries.read().await;
            let entry = entries.get(key)?;
            if entry.is_expired(self.clock.now()) {
                trace!(key, "cache entry expired");
                return None;
            }
            entry.value.clone()
        };

        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(key, error = %e, "cached payload no longer matches expected shape, treating as miss");
                self.evict(key).await;
                None
            }
        }
    }

    /// Store a value, overwriting any previous entry with a fresh timestamp
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let entry = CacheEntry {
            value,
            created_at: self.clock.now(),
            ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Remove an entry. Used when dependent state is mutated out-of-band.
    pub async fn evict(&self, key: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            debug!(key, "evicted cache entry");
        }
    }

    /// Number of entries currently held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: u32,
    }

    fn sample() -> Payload {
        Payload {
            name: "inventory".to_string(),
            count: 7,
        }
    }

    #[test]
    fn test_cache_key_grammar() {
        let account = AccountId::new("123456789012");
        assert_eq!(
            cache_key("cloudinventory", &account, None),
            "cloudinventory-123456789012"
        );
        assert_eq!(
            cache_key("metrics-ec2", &account, Some("i-0abc")),
            "metrics-ec2-123456789012-i-0abc"
        );
    }

    #[test]
    fn test_cache_keys_partition_by_account() {
        let a = AccountId::new("111111111111");
        let b = AccountId::new("222222222222");
        assert_ne!(cache_key("costsummary", &a, None), cache_key("costsummary", &b, None));
    }

    #[tokio::test]
    async fn test_get_absent_key_is_miss() {
        let store = CacheStore::new();
        assert_eq!(store.get::<Payload>("missing").await, None);
    }

    #[tokio::test]
    async fn test_put_then_get_within_ttl() {
        let store = CacheStore::new();
        store
            .put("k", &sample(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get::<Payload>("k").await, Some(sample()));
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let clock = Arc::new(ManualClock::new());
        let store = CacheStore::with_clock(clock.clone());
        let ttl = Duration::from_secs(900);
        store.put("k", &sample(), ttl).await.unwrap();

        // Servable at t0 + T - epsilon
        clock.advance(ttl - Duration::from_millis(1));
        assert_eq!(store.get::<Payload>("k").await, Some(sample()));

        // Miss at t0 + T + epsilon
        clock.advance(Duration::from_millis(2));
        assert_eq!(store.get::<Payload>("k").await, None);
    }

    #[tokio::test]
    async fn test_put_overwrites_with_fresh_timestamp() {
        let clock = Arc::new(ManualClock::new());
        let store = CacheStore::with_clock(clock.clone());
        let ttl = Duration::from_secs(10);

        store.put("k", &sample(), ttl).await.unwrap();
        clock.advance(Duration::from_secs(9));

        // Rewrite just before expiry: entry must survive another full TTL
        let updated = Payload {
            name: "inventory".to_string(),
            count: 8,
        };
        store.put("k", &updated, ttl).await.unwrap();
        clock.advance(Duration::from_secs(9));
        assert_eq!(store.get::<Payload>("k").await, Some(updated));
    }

    #[tokio::test]
    async fn test_deserialization_failure_is_miss_and_evicts() {
        let store = CacheStore::new();
        store
            .put("k", &"just a string", Duration::from_secs(60))
            .await
            .unwrap();

        // Incompatible shape reads as a miss, never an error
        assert_eq!(store.get::<Payload>("k").await, None);
        // And the poisoned entry is gone
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_evict_removes_entry() {
        let store = CacheStore::new();
        store
            .put("k", &sample(), Duration::from_secs(60))
            .await
            .unwrap();
        store.evict("k").await;
        assert_eq!(store.get::<Payload>("k").await, None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writers() {
        let store = Arc::new(CacheStore::new());
        let mut handles = Vec::new();

        for i in 0..8u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let value = Payload {
                    name: "race".to_string(),
                    count: i,
                };
                store.put("shared", &value, Duration::from_secs(60)).await.unwrap();
                store.get::<Payload>("shared").await
            }));
        }

        // Readers observe some complete payload, never a torn one
        for handle in handles {
            let observed = handle.await.unwrap();
            let payload = observed.expect("value present after own write");
            assert_eq!(payload.name, "race");
            assert!(payload.count < 8);
        }
    }
}
