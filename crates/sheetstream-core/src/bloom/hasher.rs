//! Chunked 128-bit hash accumulation
//!
//! Bytes are buffered into fixed-size chunks; every full chunk goes through
//! the Murmur3 x64 mixing rounds, 16 bytes per lane. The final partial chunk
//! is zero-padded to the chunk size and mixed like any other chunk, then the
//! total input length is folded in. Because the padding depends on the chunk
//! size, hashes are only comparable between hashers built with the same
//! chunk size.

use std::hash::Hasher;

/// Bytes mixed per lane
pub const LANE_BYTES: usize = 16;

/// Default chunk size (one lane)
pub const DEFAULT_CHUNK_BYTES: usize = LANE_BYTES;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// A 128-bit hash split into two 64-bit halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash128 {
    pub h1: u64,
    pub h2: u64,
}

impl Hash128 {
    /// Hash a byte slice with the default chunk size
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = StreamingHasher::new();
        hasher.update(bytes);
        hasher.finish_128()
    }

    /// Low 64 bits, used as a compact key
    pub fn as_u64(self) -> u64 {
        self.h1
    }
}

/// Streaming Murmur3-style hasher with a configurable chunk size
#[derive(Debug, Clone)]
pub struct StreamingHasher {
    buffer: Vec<u8>,
    chunk_size: usize,
    total_len: u64,
    h1: u64,
    h2: u64,
}

impl StreamingHasher {
    /// Create a hasher using [`DEFAULT_CHUNK_BYTES`]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_BYTES)
    }

    /// Create a hasher with `chunk_size` rounded up to a whole number of lanes
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        let lanes = chunk_size.max(1).div_ceil(LANE_BYTES);
        let chunk_size = lanes * LANE_BYTES;
        Self {
            buffer: Vec::with_capacity(chunk_size),
            chunk_size,
            total_len: 0,
            h1: 0,
            h2: 0,
        }
    }

    /// Chunk size in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Feed bytes into the hash
    pub fn update(&mut self, mut bytes: &[u8]) {
        self.total_len = self.total_len.wrapping_add(bytes.len() as u64);

        if !self.buffer.is_empty() {
            let wanted = self.chunk_size - self.buffer.len();
            let take = wanted.min(bytes.len());
            self.buffer.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
            if self.buffer.len() < self.chunk_size {
                return;
            }
            let chunk = std::mem::take(&mut self.buffer);
            self.mix_chunk(&chunk);
            self.buffer = chunk;
            self.buffer.clear();
        }

        let mut chunks = bytes.chunks_exact(self.chunk_size);
        for chunk in &mut chunks {
            self.mix_chunk(chunk);
        }
        self.buffer.extend_from_slice(chunks.remainder());
    }

    /// Finish the hash without consuming the hasher
    pub fn finish_128(&self) -> Hash128 {
        let mut state = self.clone();
        if !state.buffer.is_empty() {
            let mut chunk = std::mem::take(&mut state.buffer);
            chunk.resize(state.chunk_size, 0);
            state.mix_chunk(&chunk);
        }

        let (mut h1, mut h2) = (state.h1, state.h2);
        h1 ^= state.total_len;
        h2 ^= state.total_len;
        h1 = h1.wrapping_add(h2);
        h2 = h2.wrapping_add(h1);
        h1 = fmix64(h1);
        h2 = fmix64(h2);
        h1 = h1.wrapping_add(h2);
        h2 = h2.wrapping_add(h1);
        Hash128 { h1, h2 }
    }

    fn mix_chunk(&mut self, chunk: &[u8]) {
        for lane in chunk.chunks_exact(LANE_BYTES) {
            let mut k1 = read_u64_le(&lane[..8]);
            let mut k2 = read_u64_le(&lane[8..]);

            k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
            self.h1 ^= k1;
            self.h1 = self
                .h1
                .rotate_left(27)
                .wrapping_add(self.h2)
                .wrapping_mul(5)
                .wrapping_add(0x52dc_e729);

            k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
            self.h2 ^= k2;
            self.h2 = self
                .h2
                .rotate_left(31)
                .wrapping_add(self.h1)
                .wrapping_mul(5)
                .wrapping_add(0x3849_5ab5);
        }
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for StreamingHasher {
    fn finish(&self) -> u64 {
        self.finish_128().as_u64()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_updates_match_single_update() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let mut whole = StreamingHasher::new();
        whole.update(&data);

        let mut pieces = StreamingHasher::new();
        for piece in data.chunks(7) {
            pieces.update(piece);
        }

        assert_eq!(whole.finish_128(), pieces.finish_128());
    }

    #[test]
    fn test_length_is_part_of_hash() {
        assert_ne!(Hash128::of_bytes(b"ab"), Hash128::of_bytes(b"ab\0"));
        assert_ne!(Hash128::of_bytes(b""), Hash128::of_bytes(b"\0"));
    }

    #[test]
    fn test_chunk_size_changes_padding() {
        let mut small = StreamingHasher::with_chunk_size(16);
        let mut large = StreamingHasher::with_chunk_size(32);
        small.update(b"hello");
        large.update(b"hello");
        assert_ne!(small.finish_128(), large.finish_128());
    }

    #[test]
    fn test_chunk_size_rounds_to_lanes() {
        assert_eq!(StreamingHasher::with_chunk_size(0).chunk_size(), 16);
        assert_eq!(StreamingHasher::with_chunk_size(17).chunk_size(), 32);
    }

    #[test]
    fn test_finish_does_not_consume() {
        let mut hasher = StreamingHasher::new();
        hasher.update(b"abc");
        let first = hasher.finish_128();
        assert_eq!(first, hasher.finish_128());
        hasher.update(b"d");
        assert_ne!(first, hasher.finish_128());
    }
}
