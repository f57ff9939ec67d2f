use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Insertion-ordered map used as both a keyed index and a FIFO queue.
///
/// Iteration order is insertion order. Updating the value of an existing key
/// keeps the key's position; only removal changes the relative order of the
/// remaining keys.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    order: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the tail, or replace the value in place if the key exists.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.entries.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        None
    }

    /// Insert at the tail only if the key is absent; returns true on insert.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        true
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order.iter().filter_map(|k| {
            let v = self.entries.get(k)?;
            Some((k, v))
        })
    }

    /// 1-based position of a key in insertion order.
    pub fn position_of(&self, key: &K) -> Option<usize> {
        self.order.iter().position(|k| k == key).map(|idx| idx + 1)
    }
}

impl<K: Eq + Hash + Clone, V: Clone> OrderedMap<K, V> {
    /// Owned snapshot of the entries in insertion order. Mutation during a
    /// pass always happens against a snapshot, never mid-iteration.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(map.position_of(&"b"), Some(2));
    }

    #[test]
    fn value_update_keeps_position() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 10), Some(1));
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get(&"a"), Some(&10));
    }

    #[test]
    fn remove_then_insert_moves_to_tail() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.remove(&"a"), Some(1));
        map.insert("a", 1);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn insert_if_absent_respects_existing_entry() {
        let mut map = OrderedMap::new();
        assert!(map.insert_if_absent("a", 1));
        assert!(!map.insert_if_absent("a", 2));
        assert_eq!(map.get(&"a"), Some(&1));
    }

    #[test]
    fn snapshot_is_detached_from_the_map() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        let snap = map.snapshot();
        map.remove(&"a");
        assert_eq!(snap, vec![("a", 1), ("b", 2)]);
        assert_eq!(map.len(), 1);
    }
}
