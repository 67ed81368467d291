//! Open-addressing hash map for primitive integer keys
//!
//! Used wherever the writer needs an integer -> integer lookup on a hot path:
//! string hash -> shared string id in the SST, packed style code -> style
//! slot in the registry. Keys and values are stored inline in one backing
//! array, so there is no per-entry allocation.
//!
//! The table capacity is always prime and strictly greater than the number
//! of live entries. Probing uses double hashing; with a prime capacity every
//! step size visits every slot, so a probe always terminates.

/// Default fraction of slots that may be occupied before the table grows
pub const DEFAULT_LOAD_FACTOR: f32 = 0.85;

const MIN_CAPACITY: usize = 7;

/// Integer types usable as [`PrimitiveIndexMap`] keys
pub trait PrimitiveKey: Copy + Eq {
    /// Raw key bits fed to the slot hash
    fn key_bits(self) -> u64;
}

macro_rules! impl_primitive_key {
    ($($t:ty),*) => {
        $(
            impl PrimitiveKey for $t {
                #[inline]
                fn key_bits(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_primitive_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

#[derive(Debug, Clone, Copy)]
enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Removed,
}

/// Open-addressing map from primitive integer keys to `Copy` values
#[derive(Debug, Clone)]
pub struct PrimitiveIndexMap<K, V> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    /// Slots never written since the last rehash
    free: usize,
    /// Largest `len` allowed before growing
    max_len: usize,
    load_factor: f32,
}

enum Probe {
    Found(usize),
    Vacant(usize),
}

impl<K: PrimitiveKey, V: Copy> PrimitiveIndexMap<K, V> {
    /// Create an empty map with the default load factor
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a map sized to hold `expected` entries without rehashing
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_load_factor(expected, DEFAULT_LOAD_FACTOR)
    }

    /// Create an empty map that grows once `load_factor` of its slots are live
    pub fn with_load_factor(load_factor: f32) -> Self {
        Self::with_capacity_and_load_factor(0, load_factor)
    }

    /// Create a map with an explicit load factor (clamped to `0.1..=0.95`)
    pub fn with_capacity_and_load_factor(expected: usize, load_factor: f32) -> Self {
        let load_factor = load_factor.clamp(0.1, 0.95);
        let wanted = (expected as f64 / f64::from(load_factor)).ceil() as usize + 1;
        let capacity = next_prime(wanted.max(MIN_CAPACITY));
        let mut map = Self {
            slots: Vec::new(),
            len: 0,
            free: 0,
            max_len: 0,
            load_factor,
        };
        map.reset_slots(capacity);
        map
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the backing array (always prime)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Insert or overwrite `key`, returning the previous value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.probe(key) {
            Probe::Found(idx) => {
                let previous = match self.slots[idx] {
                    Slot::Occupied(_, v) => Some(v),
                    _ => None,
                };
                self.slots[idx] = Slot::Occupied(key, value);
                previous
            }
            Probe::Vacant(idx) => {
                let consumed_free = matches!(self.slots[idx], Slot::Empty);
                self.slots[idx] = Slot::Occupied(key, value);
                self.len += 1;
                if consumed_free {
                    self.free -= 1;
                }
                self.after_insert();
                None
            }
        }
    }

    /// Look up the value stored for `key`
    pub fn get(&self, key: K) -> Option<V> {
        match self.probe(key) {
            Probe::Found(idx) => match self.slots[idx] {
                Slot::Occupied(_, v) => Some(v),
                _ => None,
            },
            Probe::Vacant(_) => None,
        }
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: K) -> bool {
        matches!(self.probe(key), Probe::Found(_))
    }

    /// Remove `key`, returning whether it was present
    ///
    /// The slot becomes a tombstone; tombstones are reclaimed by the next
    /// rehash.
    pub fn remove(&mut self, key: K) -> bool {
        match self.probe(key) {
            Probe::Found(idx) => {
                self.slots[idx] = Slot::Removed;
                self.len -= 1;
                true
            }
            Probe::Vacant(_) => false,
        }
    }

    /// Remove every entry, keeping the current capacity
    pub fn clear(&mut self) {
        let capacity = self.slots.len();
        self.reset_slots(capacity);
    }

    /// Iterate over `(key, value)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (K, V)> + '_ {
        self.slots.iter().filter_map(|slot| match *slot {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        })
    }

    fn reset_slots(&mut self, capacity: usize) {
        self.slots = vec![Slot::Empty; capacity];
        self.len = 0;
        self.free = capacity;
        let by_load = (capacity as f64 * f64::from(self.load_factor)) as usize;
        self.max_len = by_load.min(capacity - 1).max(1);
    }

    fn after_insert(&mut self) {
        if self.len > self.max_len {
            let grown = next_prime(self.slots.len().saturating_mul(2));
            self.rehash(grown);
        } else if self.free == 0 {
            // Every non-live slot is a tombstone: compact in place.
            let capacity = self.slots.len();
            self.rehash(capacity);
        }
    }

    fn rehash(&mut self, capacity: usize) {
        let old = std::mem::take(&mut self.slots);
        self.reset_slots(capacity);
        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                if let Probe::Vacant(idx) = self.probe(k) {
                    self.slots[idx] = Slot::Occupied(k, v);
                    self.len += 1;
                    self.free -= 1;
                }
            }
        }
    }

    /// Find the slot holding `key`, or the slot an insert of `key` should use
    fn probe(&self, key: K) -> Probe {
        let capacity = self.slots.len();
        let hash = mix(key.key_bits());
        let mut idx = (hash % capacity as u64) as usize;
        let step = 1 + (hash / capacity as u64 % (capacity as u64 - 1)) as usize;
        let mut first_removed = None;

        for _ in 0..capacity {
            match self.slots[idx] {
                Slot::Empty => return Probe::Vacant(first_removed.unwrap_or(idx)),
                Slot::Occupied(k, _) if k == key => return Probe::Found(idx),
                Slot::Removed if first_removed.is_none() => first_removed = Some(idx),
                _ => {}
            }
            idx = (idx + step) % capacity;
        }

        // Every slot visited: capacity > len guarantees a tombstone exists.
        Probe::Vacant(first_removed.unwrap_or(idx))
    }
}

impl<K: PrimitiveKey, V: Copy> Default for PrimitiveIndexMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// 64-bit finalizer so sequential keys spread over the table
#[inline]
fn mix(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

/// Smallest prime `>= n`
pub fn next_prime(n: usize) -> usize {
    if n <= 2 {
        return 2;
    }
    let mut candidate = n | 1;
    while !is_prime(candidate) {
        candidate += 2;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor = 3;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}
