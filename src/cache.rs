//! Run-scoped computation cache
//!
//! Bulk knowledge-base scans are expensive and several passes want the
//! same slices. `RunCache` memoizes them for the lifetime of one pipeline
//! run; there is deliberately no persistence, so a fresh run always sees
//! fresh data.

use crate::source::SourceResult;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug)]
pub struct RunCache<K: Eq + Hash, V> {
    entries: DashMap<K, Arc<V>>,
}

impl<K: Eq + Hash, V> Default for RunCache<K, V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> RunCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> SourceResult<Arc<V>>
    where
        F: FnOnce() -> SourceResult<V>,
    {
        if let Some(found) = self.entries.get(&key) {
            return Ok(Arc::clone(&found));
        }
        let value = Arc::new(compute()?);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
