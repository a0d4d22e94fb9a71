/// Load-once cache keyed by source identity
///
/// Owned by the session rather than held globally. Values are shared as
/// `Arc`s and never mutated after insertion; `clear` drops every entry.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

pub struct SourceCache<K, V> {
    name: &'static str,
    entries: HashMap<K, Arc<V>>,
    hits: u64,
    misses: u64,
}

impl<K, V> SourceCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached value for `key`, counting the hit or miss
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        match self.entries.get(key) {
            Some(v) => {
                self.hits += 1;
                log::debug!("{} cache hit: {:?}", self.name, key);
                Some(Arc::clone(v))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    /// Return the cached value or build, store and return it.
    /// A failed build leaves the cache untouched.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        log::debug!("{} cache miss: {:?}", self.name, key);
        let value = build()?;
        Ok(self.insert(key, value))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::info!("Clearing {} cache ({} entries)", self.name, self.entries.len());
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_once() {
        let mut cache: SourceCache<String, Vec<u8>> = SourceCache::new("test");
        let mut builds = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with::<(), _>("a".to_string(), || {
                    builds += 1;
                    Ok(vec![1, 2, 3])
                })
                .unwrap();
            assert_eq!(*v, vec![1, 2, 3]);
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let mut cache: SourceCache<u32, u32> = SourceCache::new("test");
        let err = cache.get_or_try_insert_with(1, || Err::<u32, _>("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(!cache.contains(&1));
        assert_eq!(*cache.get_or_try_insert_with::<&str, _>(1, || Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_clear_drops_entries_but_shared_values_survive() {
        let mut cache: SourceCache<u32, String> = SourceCache::new("test");
        let held = cache.insert(5, "five".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&5).is_none());
        assert_eq!(held.as_str(), "five");
    }
}
