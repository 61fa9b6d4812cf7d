//! # Depot Cache - Caching Layer
//!
//! Two cache tiers for row repositories: a fast in-process tier holding
//! deserialized JSON values, and a slower key-value tier holding serialized
//! strings. Both tiers are synchronous so cache probes never suspend; only
//! store round trips do.

#![deny(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// Fast in-process cache over JSON values.
///
/// Entries are evicted by capacity and time to live. Hit and miss counters
/// feed [`CacheStats`].
pub struct FastCache {
    entries: Cache<String, Value>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl FastCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let result = self.entries.get(key);
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub fn put(&self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 {
            (hits as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entry_count: self.entries.entry_count(),
            hits,
            misses,
            hit_rate,
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Reset statistics
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for FastCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(300))
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entry_count: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub invalidations: u64,
}

/// The slower key-value tier. Backed by an external store in production and
/// by [`MemoryKeyValueCache`] in tests; values are serialized strings either
/// way.
pub trait KeyValueCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: String, value: String);
    fn remove(&self, key: &str);
}

/// In-memory key-value tier.
#[derive(Clone, Default)]
pub struct MemoryKeyValueCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Test helper.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueCache for MemoryKeyValueCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: String, value: String) {
        self.entries.lock().insert(key, value);
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}
