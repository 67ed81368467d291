//! Fixed-capacity least-recently-used cache
//!
//! Nodes live in an arena (`Vec`) and are linked by index into a doubly
//! linked recency list: head is the most recently touched entry, tail the
//! least. A hash index maps each key to its node, so `get`, `put` and
//! eviction are O(1).

use ahash::AHashMap;
use std::hash::Hash;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// LRU cache holding at most `capacity` entries
#[derive(Debug)]
pub struct BoundedLruCache<K, V> {
    nodes: Vec<Option<Node<K, V>>>,
    /// Arena slots released by eviction, reused before growing
    vacant: Vec<usize>,
    index: AHashMap<K, usize>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> BoundedLruCache<K, V> {
    /// Create a cache with the given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            nodes: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            index: AHashMap::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            capacity,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if a key is present without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Look up a value without changing recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Insert or overwrite an entry, making it most recently used
    ///
    /// Returns the entry evicted to make room, if any. Overwriting an
    /// existing key never evicts.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.nodes[idx].as_mut() {
                node.value = value;
            }
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.remove_lru()
        } else {
            None
        };

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.vacant.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.link_front(idx);
        evicted
    }

    /// Remove and return the least recently used entry
    ///
    /// An empty cache returns `None`.
    pub fn remove_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.vacant.push(idx);
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.vacant.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Iterate from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cache: self,
            cursor: self.head,
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            if let Some(head) = self.nodes[old_head].as_mut() {
                head.prev = idx;
            }
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.nodes[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        if prev != NIL {
            if let Some(p) = self.nodes[prev].as_mut() {
                p.next = next;
            }
        } else {
            self.head = next;
        }
        if next != NIL {
            if let Some(n) = self.nodes[next].as_mut() {
                n.prev = prev;
            }
        } else {
            self.tail = prev;
        }
    }
}

/// Recency-ordered iterator over a [`BoundedLruCache`]
pub struct Iter<'a, K, V> {
    cache: &'a BoundedLruCache<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = self.cache.nodes.get(self.cursor)?.as_ref()?;
        self.cursor = node.next;
        Some((&node.key, &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    fn keys<V>(cache: &BoundedLruCache<u32, V>) -> Vec<u32> {
        cache.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_capacity_four_evicts_oldest() {
        let mut cache = BoundedLruCache::new(4);
        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");
        cache.put(4, "d");

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get(&2), Some(&"b"));

        let evicted = cache.put(5, "e");
        assert_eq!(evicted, Some((1, "a")));
        assert!(!cache.contains(&1));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_get_protects_from_next_eviction() {
        let mut cache = BoundedLruCache::new(3);
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(3, 30);

        assert_eq!(cache.get(&1), Some(&10));
        assert_eq!(cache.put(4, 40), Some((2, 20)));
        assert_eq!(keys(&cache), vec![4, 1, 3]);
    }

    #[test]
    fn test_overwrite_promotes_without_resizing() {
        let mut cache = BoundedLruCache::new(2);
        cache.put(1, 1);
        cache.put(2, 2);

        assert_eq!(cache.put(1, 100), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&1), Some(&100));
        assert_eq!(keys(&cache), vec![1, 2]);

        assert_eq!(cache.put(3, 3), Some((2, 2)));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = BoundedLruCache::new(2);
        cache.put(1, 1);
        cache.put(2, 2);
        assert_eq!(cache.peek(&1), Some(&1));
        assert_eq!(cache.put(3, 3), Some((1, 1)));
    }

    #[test]
    fn test_remove_lru_on_empty_is_noop() {
        let mut cache: BoundedLruCache<u32, u32> = BoundedLruCache::new(2);
        assert_eq!(cache.remove_lru(), None);
        cache.put(7, 7);
        assert_eq!(cache.remove_lru(), Some((7, 7)));
        assert_eq!(cache.remove_lru(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut cache = BoundedLruCache::new(2);
        cache.put(1, 1);
        cache.put(2, 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);

        cache.put(3, 3);
        assert_eq!(keys(&cache), vec![3]);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut cache = BoundedLruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(1, 1);
        assert_eq!(cache.put(2, 2), Some((1, 1)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Get(u8),
        Put(u8, u16),
        RemoveLru,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..12).prop_map(Op::Get),
            (0u8..12, any::<u16>()).prop_map(|(k, v)| Op::Put(k, v)),
            Just(Op::RemoveLru),
        ]
    }

    proptest! {
        #[test]
        fn prop_matches_reference_model(capacity in 1usize..6, ops in prop::collection::vec(op(), 0..200)) {
            let mut cache = BoundedLruCache::new(capacity);
            // front = most recent
            let mut model: VecDeque<(u8, u16)> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Get(k) => {
                        let expected = model.iter().position(|(mk, _)| *mk == k).map(|pos| {
                            let entry = model.remove(pos).unwrap();
                            model.push_front(entry);
                            entry.1
                        });
                        prop_assert_eq!(cache.get(&k).copied(), expected);
                    }
                    Op::Put(k, v) => {
                        let mut expected_evicted = None;
                        if let Some(pos) = model.iter().position(|(mk, _)| *mk == k) {
                            model.remove(pos);
                        } else if model.len() == capacity {
                            expected_evicted = model.pop_back();
                        }
                        model.push_front((k, v));
                        prop_assert_eq!(cache.put(k, v), expected_evicted);
                    }
                    Op::RemoveLru => {
                        prop_assert_eq!(cache.remove_lru(), model.pop_back());
                    }
                }
                let order: Vec<(u8, u16)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                let expected: Vec<(u8, u16)> = model.iter().copied().collect();
                prop_assert_eq!(order, expected);
            }
        }
    }
}
