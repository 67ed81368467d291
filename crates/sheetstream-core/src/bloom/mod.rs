//! Approximate membership and chunked hashing
//!
//! - [`BloomFilter`] - one-sided set membership (no false negatives)
//! - [`StreamingHasher`] - 128-bit hash accumulated chunk by chunk

mod filter;
mod hasher;

pub use filter::BloomFilter;
pub use hasher::{Hash128, StreamingHasher, DEFAULT_CHUNK_BYTES, LANE_BYTES};
