//! Capacity-bounded in-memory stores with insertion-order batch eviction.
//!
//! Once a store grows past its capacity, the oldest fifth of its entries is
//! dropped in one pass. This is a best-effort bound, not an exact LRU.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

fn eviction_batch(cap: usize) -> usize {
    (cap / 5).max(1)
}

/// Set of recently seen keys used for duplicate-delivery suppression.
#[derive(Debug, Clone)]
pub struct BoundedKeySet {
    cap: usize,
    order: VecDeque<String>,
    index: HashSet<String>,
}

impl BoundedKeySet {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            order: VecDeque::new(),
            index: HashSet::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Records `key`; returns `false` when it was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.index.contains(key) {
            return false;
        }
        self.order.push_back(key.to_string());
        self.index.insert(key.to_string());
        if self.order.len() > self.cap {
            for _ in 0..eviction_batch(self.cap) {
                let Some(removed) = self.order.pop_front() else {
                    break;
                };
                self.index.remove(&removed);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

/// Key/value cache with the same bounded eviction policy as [`BoundedKeySet`].
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    cap: usize,
    order: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }
        self.order.push_back(key);
        if self.order.len() > self.cap {
            for _ in 0..eviction_batch(self.cap) {
                let Some(removed) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&removed);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_key_set_rejects_duplicate_keys() {
        let mut set = BoundedKeySet::new(10);
        assert!(set.insert("a"));
        assert!(!set.insert("a"));
        assert!(set.contains("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn functional_key_set_evicts_oldest_fifth_once_over_capacity() {
        let mut set = BoundedKeySet::new(10);
        for index in 0..10 {
            set.insert(&format!("key-{index}"));
        }
        assert_eq!(set.len(), 10);
        set.insert("key-10");
        assert_eq!(set.len(), 9);
        assert!(!set.contains("key-0"));
        assert!(!set.contains("key-1"));
        assert!(set.contains("key-2"));
        assert!(set.contains("key-10"));
    }

    #[test]
    fn regression_key_set_with_tiny_capacity_still_evicts() {
        let mut set = BoundedKeySet::new(0);
        assert_eq!(set.cap(), 1);
        set.insert("first");
        set.insert("second");
        assert!(!set.contains("first"));
        assert!(set.contains("second"));
    }

    #[test]
    fn unit_cache_overwrites_without_growing_order() {
        let mut cache = BoundedCache::new(5);
        cache.insert("id".to_string(), "Alice".to_string());
        cache.insert("id".to_string(), "Alicia".to_string());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"id".to_string()).as_deref(), Some("Alicia"));
    }

    #[test]
    fn functional_cache_evicts_in_insertion_order() {
        let mut cache = BoundedCache::new(5);
        for index in 0..6 {
            cache.insert(index, index * 10);
        }
        assert_eq!(cache.len(), 5);
        assert!(cache.get(&0).is_none());
        assert_eq!(cache.get(&5), Some(50));
    }
}
