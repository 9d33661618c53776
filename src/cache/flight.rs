//! Per-key single-flight coordination for cache rebuilds
//!
//! A cold or expired cache key can be requested by many callers at once;
//! without coordination each of them would run the same expensive directory
//! scan (a cache stampede). `FlightGroup` hands out one async mutex per key:
//! the first caller to take it performs the rebuild, every later caller
//! blocks on the same mutex and then finds the freshly-cached value on its
//! re-check.
//!
//! Usage pattern (see the engine's get-or-build flow):
//!
//! ```rust,ignore
//! if let Some(hit) = cache.get(&key) { return hit; }
//! let guard = flights.lock(key.clone()).await;
//! if let Some(hit) = cache.get(&key) { return hit; } // built while waiting
//! let value = rebuild().await;
//! cache.set(key.clone(), value.clone(), ttl);
//! drop(guard);
//! flights.forget(&key);
//! ```

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per in-flight cache key
pub struct FlightGroup<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> FlightGroup<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty group
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the rebuild lock for `key`, waiting if another caller holds it.
    ///
    /// Callers must re-check the cache after acquisition: holding the guard
    /// after a wait almost always means the previous holder already built
    /// and cached the value.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry for `key` once no caller is using it.
    ///
    /// Waiters still hold clones of the mutex Arc, so the entry survives
    /// until the last of them releases it; the map stays bounded by the set
    /// of keys with rebuilds actually in flight.
    pub fn forget(&self, key: &K) {
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of keys currently tracked (in-flight or awaiting forget)
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is currently tracked
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for FlightGroup<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_lock_serializes_same_key() {
        let group = Arc::new(FlightGroup::new());
        let builds = Arc::new(AtomicU64::new(0));
        let cache: Arc<crate::cache::CacheStore<String, u64>> =
            Arc::new(crate::cache::CacheStore::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let group = group.clone();
            let builds = builds.clone();
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let key = "k".to_string();
                if let Some(v) = cache.get(&key) {
                    return v;
                }
                let guard = group.lock(key.clone()).await;
                if let Some(v) = cache.get(&key) {
                    return v;
                }
                // Simulate the expensive rebuild
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                builds.fetch_add(1, Ordering::SeqCst);
                cache.set(key.clone(), 42, std::time::Duration::from_secs(60));
                drop(guard);
                group.forget(&key);
                42
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forget_releases_idle_entry() {
        let group: FlightGroup<String> = FlightGroup::new();
        let guard = group.lock("k".to_string()).await;
        assert_eq!(group.len(), 1);

        // Still held: forget is a no-op
        group.forget(&"k".to_string());
        assert_eq!(group.len(), 1);

        drop(guard);
        group.forget(&"k".to_string());
        assert!(group.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let group: FlightGroup<String> = FlightGroup::new();
        let _a = group.lock("a".to_string()).await;
        // Must not deadlock waiting on "a"
        let _b = group.lock("b".to_string()).await;
        assert_eq!(group.len(), 2);
    }
}
