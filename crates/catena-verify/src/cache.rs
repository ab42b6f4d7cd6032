//! Soft-capacity concurrent caches.
//!
//! Entries are hints, never binding state: losing one only costs a repeat
//! lookup. When the map reaches its soft capacity, roughly half of it is
//! dropped at once instead of tracking per-entry recency.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Default soft capacity for verifier caches.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Hit/miss counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

/// A concurrent map with coarse eviction past a soft capacity.
#[derive(Debug)]
pub struct SoftCache<K: Eq + Hash, V> {
    map: DashMap<K, V>,
    soft_capacity: usize,
    stats: CacheStats,
}

impl<K: Eq + Hash, V: Clone> SoftCache<K, V> {
    pub fn new(soft_capacity: usize) -> Self {
        Self {
            map: DashMap::new(),
            soft_capacity: soft_capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        match self.map.get(key) {
            Some(v) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(v.value().clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: K, value: V) {
        if self.map.len() >= self.soft_capacity && !self.map.contains_key(&key) {
            self.evict();
        }
        self.map.insert(key, value);
    }

    pub fn remove(&self, key: &K) {
        self.map.remove(key);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every other entry.
    fn evict(&self) {
        let mut keep = false;
        self.map.retain(|_, _| {
            keep = !keep;
            keep
        });
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
    }
}
