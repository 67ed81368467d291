//! Bloom filter for approximate set membership

use std::f64::consts::LN_2;
use std::hash::Hash;

use super::hasher::{Hash128, StreamingHasher};

/// Bloom filter sized from an expected insertion count and false-positive rate
///
/// Bits are only ever set. `might_contain` returning `false` means the value
/// was never inserted; `true` means it probably was.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    insertions: u64,
}

impl BloomFilter {
    /// Size a filter for `expected_insertions` at `false_positive_rate`
    ///
    /// Uses `m = -n ln p / (ln 2)^2` bits and `k = round(m / n * ln 2)`
    /// hash functions. The rate is clamped into `(0, 0.5]`.
    pub fn new(expected_insertions: u64, false_positive_rate: f64) -> Self {
        let n = expected_insertions.max(1) as f64;
        let p = if false_positive_rate.is_finite() {
            false_positive_rate.clamp(1e-12, 0.5)
        } else {
            0.03
        };

        let wanted_bits = (-n * p.ln() / (LN_2 * LN_2)).ceil().max(64.0) as u64;
        let words = wanted_bits.div_ceil(64);
        let num_bits = words * 64;
        let num_hashes = ((num_bits as f64 / n) * LN_2).round().clamp(1.0, 30.0) as u32;

        Self {
            bits: vec![0; words as usize],
            num_bits,
            num_hashes,
            insertions: 0,
        }
    }

    /// Number of bits in the filter
    pub fn bit_size(&self) -> u64 {
        self.num_bits
    }

    /// Number of hash functions applied per value
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Number of `put` calls that changed at least one bit
    pub fn insertions(&self) -> u64 {
        self.insertions
    }

    /// Expected false-positive rate given the insertions so far
    pub fn expected_fpp(&self) -> f64 {
        let k = f64::from(self.num_hashes);
        let exponent = -k * self.insertions as f64 / self.num_bits as f64;
        (1.0 - exponent.exp()).powf(k)
    }

    /// Insert a hashable value; returns whether any bit changed
    pub fn put<T: Hash + ?Sized>(&mut self, value: &T) -> bool {
        self.put_hash(hash_value(value))
    }

    /// Test a hashable value
    pub fn might_contain<T: Hash + ?Sized>(&self, value: &T) -> bool {
        self.might_contain_hash(hash_value(value))
    }

    /// Insert a precomputed hash; returns whether any bit changed
    pub fn put_hash(&mut self, hash: Hash128) -> bool {
        let mut changed = false;
        for bit in self.bit_positions(hash) {
            let (word, mask) = ((bit / 64) as usize, 1u64 << (bit % 64));
            if self.bits[word] & mask == 0 {
                self.bits[word] |= mask;
                changed = true;
            }
        }
        if changed {
            self.insertions += 1;
        }
        changed
    }

    /// Test a precomputed hash
    pub fn might_contain_hash(&self, hash: Hash128) -> bool {
        self.bit_positions(hash)
            .all(|bit| self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0)
    }

    /// Double hashing: bit_i = (h1 + i * h2) mod m
    fn bit_positions(&self, hash: Hash128) -> impl Iterator<Item = u64> {
        let num_bits = self.num_bits;
        let mut combined = hash.h1;
        (0..self.num_hashes).map(move |_| {
            let bit = (combined & (u64::MAX >> 1)) % num_bits;
            combined = combined.wrapping_add(hash.h2);
            bit
        })
    }
}

fn hash_value<T: Hash + ?Sized>(value: &T) -> Hash128 {
    let mut hasher = StreamingHasher::new();
    value.hash(&mut hasher);
    hasher.finish_128()
}
