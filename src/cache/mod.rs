//! Bounded LRU cache for shard payloads
//!
//! The shard store keeps the last-known-good ciphertext of every shard it
//! has touched in one of these, so repeated reads of a hot shard never hit
//! the disk. The cache serializes its own mutations; callers need no
//! external locking.
//!
//! # Invariants Enforced
//!
//! - Recency updates on both `get` and `put` (access order, not insertion)
//! - Exactly one eviction per insert that overflows capacity
//! - Eviction removes the least-recently-used entry first

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use serde::Serialize;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hits over total accesses, 0.0 when nothing has been accessed yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

struct Inner<K, V> {
    map: HashMap<K, V>,
    /// Recency order, least-recently-used first.
    order: Vec<K>,
    hits: u64,
    misses: u64,
    puts: u64,
    evictions: u64,
}

/// A thread-safe LRU cache with a fixed capacity.
///
/// All operations lock a single internal mutex, so the cache is safe to
/// share behind an `Arc` without further coordination.
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. A zero-capacity cache is a
    /// misconfiguration, not a runtime condition.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruCache capacity must be positive");
        Self {
            capacity,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: Vec::new(),
                hits: 0,
                misses: 0,
                puts: 0,
                evictions: 0,
            }),
        }
    }

    /// Looks up `key`, marking it most-recently-used on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        match inner.map.get(key).cloned() {
            Some(value) => {
                inner.hits += 1;
                Self::touch(&mut inner.order, key);
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    ///
    /// If the insert would exceed capacity the least-recently-used entry
    /// is evicted first.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        inner.puts += 1;

        let previous = inner.map.insert(key.clone(), value);
        if previous.is_some() {
            Self::touch(&mut inner.order, &key);
            return previous;
        }

        inner.order.push(key);
        if inner.map.len() > self.capacity {
            let evicted = inner.order.remove(0);
            inner.map.remove(&evicted);
            inner.evictions += 1;
        }
        None
    }

    /// Removes `key`, returning its value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.map.remove(key);
        if removed.is_some() {
            inner.order.retain(|k| k != key);
        }
        removed
    }

    /// Drops every entry and resets the statistics.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.clear();
        inner.order.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.puts = 0;
        inner.evictions = 0;
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `key` is currently cached. Does not affect recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().unwrap().map.contains_key(key)
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            size: inner.map.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            puts: inner.puts,
            evictions: inner.evictions,
        }
    }

    /// Hits over total accesses.
    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate()
    }

    fn touch(order: &mut Vec<K>, key: &K) {
        if let Some(pos) = order.iter().position(|k| k == key) {
            let k = order.remove(pos);
            order.push(k);
        }
    }
}
