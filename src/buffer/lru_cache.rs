//! LRU page cache - the eviction substrate of the buffer pool.
//!
//! [`PageCache`] is a capacity-bounded map ordered by recency of access. It
//! knows nothing about pages or disks: the buffer pool decides what happens
//! to a victim (write-back) before asking the cache to drop it.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::common::{Error, Result};

/// Capacity-bounded map with least-recently-used eviction.
///
/// Both [`get`](Self::get) and [`put`](Self::put) promote an entry to
/// most-recently-used. [`contains_key`](Self::contains_key) and
/// [`peek`](Self::peek) leave the order alone.
///
/// # Thread Safety
/// `PageCache` is not internally synchronized; every mutating method takes
/// `&mut self`. The buffer pool keeps it behind a single mutex so that a
/// lookup → evict → insert sequence is one critical section.
///
/// # Example
/// ```
/// use heapdb::buffer::PageCache;
///
/// let mut cache = PageCache::new(2).unwrap();
/// cache.put(1, "a");
/// cache.put(2, "b");
/// cache.get(&1);                       // 2 is now least recently used
/// assert_eq!(cache.put(3, "c"), Some((2, "b")));
/// assert_eq!(cache.len(), 2);
/// ```
pub struct PageCache<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq, V> PageCache<K, V> {
    /// # Errors
    /// `Error::InvalidConfig` if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity =
            NonZeroUsize::new(capacity).ok_or(Error::InvalidConfig("cache capacity must be > 0"))?;
        Ok(Self {
            inner: LruCache::new(capacity),
        })
    }

    /// Membership test with no effect on recency.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Look up `key` and mark it most-recently-used.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Look up `key` without touching recency.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.inner.peek(key)
    }

    /// Insert or replace `key`, making it most-recently-used.
    ///
    /// Replacing an existing key never grows the cache. Inserting a new key
    /// into a full cache evicts the least-recently-used entry first and
    /// returns it.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            None
        } else {
            self.inner.push(key, value)
        }
    }

    /// Remove and return the least-recently-used entry.
    ///
    /// Returns `None` on an empty cache; callers treat that as a bug.
    #[inline]
    pub fn evict(&mut self) -> Option<(K, V)> {
        self.inner.pop_lru()
    }

    /// The entry [`evict`](Self::evict) would remove next.
    #[inline]
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.inner.peek_lru()
    }

    /// Drop `key` regardless of its position.
    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Entries from least- to most-recently-used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter().rev()
    }

    /// Keys from least- to most-recently-used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Values from least- to most-recently-used.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}
