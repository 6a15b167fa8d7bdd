// crates/bloom_core/src/consts.rs

/// Seeds for the two base hashes of the double-hashing expansion.
/// Changing either one invalidates every persisted filter.
pub const SEED_A: u64 = 0;
pub const SEED_B: u64 = 0x9E37_79B9_7F4A_7C15;

/// Probability table bounds (inclusive).
pub const MAX_TABLE_K: u32 = 12;
pub const MAX_BITS_PER_ELEMENT: u32 = 32;

pub const MANIFEST_VERSION: u16 = 1;
pub const MANIFEST_SUFFIX: &str = "json";

/// Bytes needed to hold `n_bits` packed bits.
#[inline]
pub const fn bytes_for_bits(n_bits: u64) -> u64 {
    n_bits / 8 + (n_bits % 8 != 0) as u64
}

const _: () = { assert!(bytes_for_bits(9) == 2 && bytes_for_bits(u64::MAX) == 1 << 61); };
