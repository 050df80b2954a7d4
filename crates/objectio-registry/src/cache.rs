//! Thread-safe LRU cache for location records: an open-addressing hash
//! table with per-bucket singly linked collision chains, plus a global
//! doubly linked LRU list. Both structures live in one arena so the
//! `RwLock` guards table and list together, per the no-raw-pointers
//! design: node identity is an arena index, not a pointer.

use objectio_common::{hash::xxhash64, LocationRecord, RegistryKey};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_TTL_SECS: u64 = 60;

const CACHE_SEED: u64 = 0x5EED_CAC4_5EED_CAC4;

struct Node {
    key: RegistryKey,
    location: LocationRecord,
    expiry: Instant,
    chain_next: Option<usize>,
    lru_prev: Option<usize>,
    lru_next: Option<usize>,
}

struct Inner {
    buckets: Vec<Option<usize>>,
    arena: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>, // MRU
    tail: Option<usize>, // LRU
    len: usize,
}

impl Inner {
    fn bucket_of(&self, key: &RegistryKey) -> usize {
        let hash = xxhash64(CACHE_SEED, key.build().as_bytes());
        (hash % self.buckets.len() as u64) as usize
    }

    fn find(&self, key: &RegistryKey) -> Option<usize> {
        let mut cur = self.buckets[self.bucket_of(key)];
        while let Some(idx) = cur {
            let node = self.arena[idx].as_ref().expect("arena slot occupied");
            if &node.key == key {
                return Some(idx);
            }
            cur = node.chain_next;
        }
        None
    }

    fn unlink_chain(&mut self, key: &RegistryKey, idx: usize) {
        let bucket = self.bucket_of(key);
        let mut cur = self.buckets[bucket];
        let mut prev: Option<usize> = None;
        while let Some(cursor) = cur {
            let next = self.arena[cursor].as_ref().unwrap().chain_next;
            if cursor == idx {
                match prev {
                    Some(p) => self.arena[p].as_mut().unwrap().chain_next = next,
                    None => self.buckets[bucket] = next,
                }
                return;
            }
            prev = Some(cursor);
            cur = next;
        }
    }

    fn unlink_lru(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.arena[idx].as_ref().unwrap();
            (node.lru_prev, node.lru_next)
        };
        match prev {
            Some(p) => self.arena[p].as_mut().unwrap().lru_next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.arena[n].as_mut().unwrap().lru_prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.arena[idx].as_mut().unwrap();
            node.lru_prev = None;
            node.lru_next = old_head;
        }
        if let Some(h) = old_head {
            self.arena[h].as_mut().unwrap().lru_prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink_lru(idx);
        self.push_front(idx);
    }

    fn remove_at(&mut self, idx: usize) -> Node {
        let key = self.arena[idx].as_ref().unwrap().key.clone();
        self.unlink_chain(&key, idx);
        self.unlink_lru(idx);
        let node = self.arena[idx].take().expect("node existed");
        self.free.push(idx);
        self.len -= 1;
        node
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.evictions.load(Ordering::Relaxed),
        )
    }
}

/// A thread-safe, TTL-aware LRU cache of location records.
pub struct RegistryCache {
    inner: RwLock<Inner>,
    max_entries: usize,
    ttl: Duration,
    stats: CacheStats,
}

impl RegistryCache {
    #[must_use]
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let bucket_count = next_odd(max_entries.max(1).div_ceil(10));
        Self {
            inner: RwLock::new(Inner {
                buckets: vec![None; bucket_count],
                arena: Vec::new(),
                free: Vec::new(),
                head: None,
                tail: None,
                len: 0,
            }),
            max_entries: max_entries.max(1),
            ttl,
            stats: CacheStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.inner.read().len
    }

    /// Inserts or overwrites a cache entry with a fresh TTL, evicting the
    /// LRU tail if the cache is at capacity.
    pub fn insert(&self, key: RegistryKey, location: LocationRecord) {
        let expiry = Instant::now() + self.ttl;
        let mut inner = self.inner.write();

        if let Some(idx) = inner.find(&key) {
            inner.remove_at(idx);
        } else if inner.len >= self.max_entries {
            if let Some(tail) = inner.tail {
                inner.remove_at(tail);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        let node = Node {
            key: key.clone(),
            location,
            expiry,
            chain_next: None,
            lru_prev: None,
            lru_next: None,
        };

        let idx = if let Some(free) = inner.free.pop() {
            inner.arena[free] = Some(node);
            free
        } else {
            inner.arena.push(Some(node));
            inner.arena.len() - 1
        };

        let bucket = inner.bucket_of(&key);
        let head = inner.buckets[bucket];
        inner.arena[idx].as_mut().unwrap().chain_next = head;
        inner.buckets[bucket] = Some(idx);

        inner.push_front(idx);
        inner.len += 1;
    }

    /// Looks up `key`, promoting a hit to MRU. An expired entry is
    /// evicted and counted as a miss, forcing the caller to fall back to
    /// storage.
    #[must_use]
    pub fn lookup(&self, key: &RegistryKey) -> Option<LocationRecord> {
        {
            let inner = self.inner.read();
            if let Some(idx) = inner.find(key) {
                let node = inner.arena[idx].as_ref().unwrap();
                if node.expiry > Instant::now() {
                    let location = node.location.clone();
                    drop(inner);
                    let mut inner = self.inner.write();
                    if let Some(idx) = inner.find(key) {
                        inner.promote(idx);
                    }
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(location);
                }
            }
        }
        let mut inner = self.inner.write();
        if let Some(idx) = inner.find(key) {
            inner.remove_at(idx);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Removes `key` if present; returns whether it was present.
    pub fn invalidate(&self, key: &RegistryKey) -> bool {
        let mut inner = self.inner.write();
        if let Some(idx) = inner.find(key) {
            inner.remove_at(idx);
            true
        } else {
            false
        }
    }
}

fn next_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}
