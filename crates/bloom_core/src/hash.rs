//! Seeded 64-bit hashing and the Kirsch–Mitzenmacher position expansion.
//!
//! Only two base hashes are computed per key; the k probe positions are
//! derived as `(h_a + i * h_b) mod m` for `i = 1..=k`. Positions are 0-based.
use crate::consts::{SEED_A, SEED_B};

/// A general-purpose hash keyed by a 64-bit seed.
///
/// Implementations must be deterministic for a given `(bytes, seed)` pair and,
/// for persistent filters, stable across processes and crate versions.
pub trait SeededHasher {
    fn hash_seeded(&self, bytes: &[u8], seed: u64) -> u64;

    /// Short name recorded in filter manifests.
    fn name(&self) -> &'static str;
}

/// xxh3-64 with seed. Default hasher.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hasher;

impl SeededHasher for Xxh3Hasher {
    #[inline]
    fn hash_seeded(&self, bytes: &[u8], seed: u64) -> u64 {
        xxhash_rust::xxh3::xxh3_64_with_seed(bytes, seed)
    }

    fn name(&self) -> &'static str { "xxh3" }
}

/// blake3 keyed hash; the seed occupies the first 8 bytes of the key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl SeededHasher for Blake3Hasher {
    #[inline]
    fn hash_seeded(&self, bytes: &[u8], seed: u64) -> u64 {
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&seed.to_le_bytes());
        let dig = blake3::keyed_hash(&key, bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&dig.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    fn name(&self) -> &'static str { "blake3" }
}

/// The k probe positions of `key` in `[0, modulus)`.
///
/// Distinct `i` may land on the same position; that only lowers the effective
/// k for this key.
pub fn expand<H: SeededHasher + ?Sized>(
    hasher: &H,
    key: &[u8],
    k: u32,
    modulus: u64,
) -> impl Iterator<Item = u64> {
    debug_assert!(modulus > 0, "modulus must be positive");
    let h_a = hasher.hash_seeded(key, SEED_A);
    let h_b = hasher.hash_seeded(key, SEED_B);
    (1..=k as u64).map(move |i| h_a.wrapping_add(i.wrapping_mul(h_b)) % modulus)
}
