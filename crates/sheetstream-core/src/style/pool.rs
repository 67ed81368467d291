//! Deduplicating pools for style components

use ahash::AHashMap;
use std::hash::Hash;

/// Pool of unique style components addressed by dense index
///
/// Spreadsheets typically share a handful of fonts, fills and borders across
/// millions of cells. Each distinct value is stored once and cells reference
/// it by index.
#[derive(Debug, Clone)]
pub struct ComponentPool<T> {
    items: Vec<T>,
    index: AHashMap<T, u32>,
}

impl<T: Hash + Eq + Clone> ComponentPool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Create a pool whose first entries are `seed`, in order
    pub fn seeded<I: IntoIterator<Item = T>>(seed: I) -> Self {
        let mut pool = Self::new();
        for item in seed {
            pool.get_or_insert(&item, u32::MAX);
        }
        pool
    }

    /// Index of `item`, inserting it if new
    ///
    /// Returns `None` when the item is new and the pool already holds
    /// `max_index + 1` entries; the pool is left unchanged in that case.
    pub fn get_or_insert(&mut self, item: &T, max_index: u32) -> Option<u32> {
        if let Some(&idx) = self.index.get(item) {
            return Some(idx);
        }

        let idx = u32::try_from(self.items.len()).ok()?;
        if idx > max_index {
            return None;
        }
        self.items.push(item.clone());
        self.index.insert(item.clone(), idx);
        Some(idx)
    }

    /// Index of an existing item
    pub fn index_of(&self, item: &T) -> Option<u32> {
        self.index.get(item).copied()
    }

    /// Item at `index`
    pub fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in index order
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: Hash + Eq + Clone> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
