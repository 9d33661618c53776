//! Generic TTL-keyed result cache
//!
//! Stores arbitrary aggregation results with a per-entry TTL. Expiry is
//! evaluated lazily at read time: an expired entry is treated as a miss and
//! evicted on the spot. [`CacheStore::optimize`] sweeps all expired entries
//! proactively. The store is TTL-agnostic; callers pick the tier (see
//! [`crate::config::CacheConfig`]).
//!
//! Entries are immutable after creation; `set` replaces rather than mutates.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

/// A cached value with its creation time and TTL
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    /// Entries currently live
    pub active: usize,
    /// Entries present but past their TTL (not yet evicted)
    pub expired: usize,
    /// Total cache hits since construction or clear
    pub hits: u64,
    /// Total cache misses since construction or clear
    pub misses: u64,
}

impl CacheStatsSnapshot {
    /// Hit rate over all lookups (0.0 when none have happened)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// TTL-keyed cache of aggregation results
///
/// All operations take `&self`; the entry map is guarded by a single
/// [`RwLock`] so mutations on a key are linearizable, and administrative
/// clear/optimize take the same lock as the read/write path.
pub struct CacheStore<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a key, lazily evicting it when expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            if entry.is_expired() {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace a value under `key` with the given TTL.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.entries.write().insert(key, CacheEntry::new(value, ttl));
    }

    /// Remove a single key. Returns whether an entry was present.
    pub fn delete(&self, key: &K) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Remove every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of entries currently stored, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Evict every currently-expired entry and report how many were removed.
    ///
    /// Live entries are untouched.
    pub fn optimize(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    /// Counters for monitoring. Classifies entries without evicting them.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();
        CacheStatsSnapshot {
            active: entries.len() - expired,
            expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> Default for CacheStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
