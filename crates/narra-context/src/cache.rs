//! Bounded LRU cache.
//!
//! String-keyed, move-to-end on access, evict the least recently used entry
//! on insert past capacity. The builder keeps one per cached product; none
//! of them are shared across threads.

/// Default capacity for builder caches.
pub const DEFAULT_CAPACITY: usize = 128;

/// A small bounded cache with LRU eviction.
#[derive(Clone, Debug)]
pub struct LruCache<T> {
    capacity: usize,
    // Most recently used at the back.
    entries: Vec<(String, T)>,
}

impl<T> Default for LruCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> LruCache<T> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// Look up a key, marking it most recently used on hit.
    pub fn get(&mut self, key: &str) -> Option<&T> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(idx);
        self.entries.push(entry);
        self.entries.last().map(|(_, v)| v)
    }

    /// Insert or replace a value, evicting the least recently used entry
    /// when over capacity.
    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        if let Some(idx) = self.entries.iter().position(|(k, _)| k == &key) {
            let _ = self.entries.remove(idx);
        }
        self.entries.push((key, value));
        if self.entries.len() > self.capacity {
            let _ = self.entries.remove(0);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
