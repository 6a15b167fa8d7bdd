//! Bloom filter over a [`BitStore`], sized by one of the [`Sizing`] policies.
//!
//! Bits are only ever set, so a key that was inserted keeps answering `true`.
use crate::errors::{BloomError, Result};
use crate::hash::{expand, SeededHasher, Xxh3Hasher};
use crate::sizing::{FilterParams, Sizing};
use crate::store::{BitStore, HeapBits, MappedBits};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct BloomFilter<S: BitStore = HeapBits, H: SeededHasher = Xxh3Hasher> {
    params: FilterParams,
    store: S,
    hasher: H,
}

/// Point-in-time summary of a filter.
#[derive(Debug, Clone, Serialize)]
pub struct FilterStats {
    pub capacity: u64,
    pub error_rate: Option<f64>,
    pub estimated_error_rate: f64,
    pub k: u32,
    pub n_bits: u64,
    pub bits_per_element: u32,
    pub persistent: bool,
    pub path: Option<PathBuf>,
    pub set_bits: u64,
    pub fill_ratio: f64,
    pub hasher: &'static str,
}

impl BloomFilter<HeapBits> {
    pub fn with_bits(capacity: u64, bits_per_element: u32, k: u32) -> Result<Self> {
        Self::from_params(Sizing::Explicit { bits_per_element, k }.resolve(capacity)?)
    }

    pub fn with_error_rate_and_k(capacity: u64, error_rate: f64, k: u32) -> Result<Self> {
        Self::from_params(Sizing::ErrorRateWithK { error_rate, k }.resolve(capacity)?)
    }

    pub fn with_error_rate(capacity: u64, error_rate: f64) -> Result<Self> {
        Self::from_params(Sizing::OptimalK { error_rate }.resolve(capacity)?)
    }

    pub fn from_params(params: FilterParams) -> Result<Self> {
        params.validate()?;
        Self::from_parts(params, HeapBits::new(params.n_bits)?, Xxh3Hasher)
    }
}

impl BloomFilter<MappedBits> {
    pub fn open_with_bits(path: impl AsRef<Path>, capacity: u64, bits_per_element: u32, k: u32) -> Result<Self> {
        Self::open_params(path, Sizing::Explicit { bits_per_element, k }.resolve(capacity)?)
    }

    pub fn open_with_error_rate_and_k(path: impl AsRef<Path>, capacity: u64, error_rate: f64, k: u32) -> Result<Self> {
        Self::open_params(path, Sizing::ErrorRateWithK { error_rate, k }.resolve(capacity)?)
    }

    pub fn open_with_error_rate(path: impl AsRef<Path>, capacity: u64, error_rate: f64) -> Result<Self> {
        Self::open_params(path, Sizing::OptimalK { error_rate }.resolve(capacity)?)
    }

    /// Map (or create) the bit file at `path` for `params`. Reopening an
    /// existing file keeps its bits; the caller must pass the parameters the
    /// file was created with.
    pub fn open_params(path: impl AsRef<Path>, params: FilterParams) -> Result<Self> {
        params.validate()?;
        let store = MappedBits::open(path, params.n_bits)?;
        Self::from_parts(params, store, Xxh3Hasher)
    }
}

impl<S: BitStore, H: SeededHasher> BloomFilter<S, H> {
    /// Assemble a filter from resolved parameters, a store and a hasher.
    pub fn from_parts(params: FilterParams, store: S, hasher: H) -> Result<Self> {
        params.validate()?;
        if store.len() != params.n_bits {
            return Err(BloomError::InvalidParameters(format!(
                "store holds {} bits, params need {}",
                store.len(),
                params.n_bits
            )));
        }
        debug!(n_bits = params.n_bits, k = params.k, persistent = store.path().is_some(), "bloom filter ready");
        Ok(Self { params, store, hasher })
    }

    /// Probe positions of `key`, in `[0, n_bits)`.
    pub fn positions<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Vec<u64> {
        expand(&self.hasher, key.as_ref(), self.params.k, self.params.n_bits).collect()
    }

    pub fn insert<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) {
        for p in expand(&self.hasher, key.as_ref(), self.params.k, self.params.n_bits) {
            self.store.set(p);
        }
    }

    /// Insert keys in order.
    pub fn insert_all<I>(&mut self, keys: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for key in keys {
            self.insert(key.as_ref());
        }
    }

    /// `true` if `key` may be present; `false` means it was never inserted.
    pub fn query<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        expand(&self.hasher, key.as_ref(), self.params.k, self.params.n_bits).all(|p| self.store.get(p))
    }

    pub fn query_all<I>(&self, keys: I) -> Vec<bool>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        keys.into_iter().map(|key| self.query(key.as_ref())).collect()
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    pub fn params(&self) -> &FilterParams { &self.params }
    pub fn capacity(&self) -> u64 { self.params.capacity }
    pub fn k(&self) -> u32 { self.params.k }
    pub fn n_bits(&self) -> u64 { self.params.n_bits }
    pub fn bits_per_element(&self) -> u32 { self.params.bits_per_element }

    /// Requested or table-adjusted rate; NaN for explicitly sized filters.
    pub fn error_rate(&self) -> f64 { self.params.error_rate }

    /// Closed-form rate at the filter's actual bits-per-element and k.
    pub fn estimated_error_rate(&self) -> f64 { self.params.estimated_error_rate() }

    pub fn is_persistent(&self) -> bool { self.store.path().is_some() }
    pub fn path(&self) -> Option<&Path> { self.store.path() }
    pub fn count_set(&self) -> u64 { self.store.count_set() }

    pub fn fill_ratio(&self) -> f64 {
        self.store.count_set() as f64 / self.params.n_bits as f64
    }

    /// Raw packed bits, as laid out in a persistent file.
    pub fn as_bytes(&self) -> &[u8] { self.store.as_bytes() }

    pub fn hasher(&self) -> &H { &self.hasher }

    pub fn stats(&self) -> FilterStats {
        let set_bits = self.store.count_set();
        FilterStats {
            capacity: self.params.capacity,
            error_rate: Some(self.params.error_rate).filter(|r| !r.is_nan()),
            estimated_error_rate: self.estimated_error_rate(),
            k: self.params.k,
            n_bits: self.params.n_bits,
            bits_per_element: self.params.bits_per_element,
            persistent: self.is_persistent(),
            path: self.path().map(Path::to_path_buf),
            set_bits,
            fill_ratio: set_bits as f64 / self.params.n_bits as f64,
            hasher: self.hasher.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Blake3Hasher;

    #[test]
    fn insert_then_query() {
        let mut f = BloomFilter::with_error_rate(100, 0.01).unwrap();
        assert!(!f.query("a"));
        f.insert("a");
        f.insert(&String::from("b"));
        f.insert(&b"c"[..]);
        assert!(f.query("a") && f.query("b") && f.query(b"c"));
    }

    #[test]
    fn insert_is_idempotent() {
        let mut f = BloomFilter::with_bits(50, 8, 4).unwrap();
        f.insert("x");
        let once = f.as_bytes().to_vec();
        f.insert("x");
        assert_eq!(f.as_bytes(), &once[..]);
        assert!(f.query("x"));
    }

    #[test]
    fn insert_sets_every_position() {
        let mut f = BloomFilter::with_bits(64, 10, 6).unwrap();
        f.insert("key");
        let pos = f.positions("key");
        assert_eq!(pos.len(), 6);
        let mut distinct = pos.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(f.count_set(), distinct.len() as u64);
        assert!(pos.iter().all(|&p| p < f.n_bits()));
    }

    #[test]
    fn query_all_matches_query() {
        let mut f = BloomFilter::with_bits(16, 4, 2).unwrap();
        f.insert_all(["a", "b", "c"]);
        let keys = ["a", "z", "b", "y", "c", "x"];
        let want: Vec<bool> = keys.iter().map(|k| f.query(k)).collect();
        assert_eq!(f.query_all(keys), want);
        assert!(f.query_all(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn introspection() {
        let f = BloomFilter::with_error_rate_and_k(1_000, 0.01, 5).unwrap();
        assert_eq!(f.capacity(), 1_000);
        assert_eq!(f.k(), 5);
        assert_eq!(f.n_bits(), 1_000 * f.bits_per_element() as u64);
        assert!(f.error_rate() <= 0.01);
        assert!(!f.is_persistent());
        assert_eq!(f.path(), None);
        assert_eq!(f.fill_ratio(), 0.0);
        let s = f.stats();
        assert_eq!(s.hasher, "xxh3");
        assert_eq!(s.set_bits, 0);

        let e = BloomFilter::with_bits(10, 3, 2).unwrap();
        assert!(e.error_rate().is_nan());
        assert_eq!(e.stats().error_rate, None);
    }

    #[test]
    fn custom_hasher() {
        let params = Sizing::OptimalK { error_rate: 0.05 }.resolve(200).unwrap();
        let mut f = BloomFilter::from_parts(params, HeapBits::new(params.n_bits).unwrap(), Blake3Hasher).unwrap();
        f.insert("k");
        assert!(f.query("k"));
        assert_eq!(f.stats().hasher, "blake3");
    }

    #[test]
    fn from_parts_rejects_wrong_store() {
        let params = Sizing::Explicit { bits_per_element: 4, k: 2 }.resolve(10).unwrap();
        let res = BloomFilter::from_parts(params, HeapBits::new(39).unwrap(), Xxh3Hasher);
        assert!(matches!(res, Err(BloomError::InvalidParameters(_))));
    }

    #[test]
    fn raw_params_are_validated() {
        let good = Sizing::Explicit { bits_per_element: 8, k: 3 }.resolve(10).unwrap();
        let zero_k = FilterParams { k: 0, ..good };
        let short = FilterParams { capacity: 1_000, bits_per_element: 10, n_bits: 16, ..good };
        let empty = FilterParams { n_bits: 0, ..good };
        for bad in [zero_k, short, empty] {
            assert!(matches!(BloomFilter::from_params(bad), Err(BloomError::InvalidParameters(_))));
            assert!(matches!(
                BloomFilter::from_parts(bad, HeapBits::new(bad.n_bits).unwrap(), Xxh3Hasher),
                Err(BloomError::InvalidParameters(_))
            ));
        }
        assert!(BloomFilter::from_params(good).is_ok());
    }

    #[test]
    fn open_params_rejects_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bits");
        let good = Sizing::Explicit { bits_per_element: 8, k: 3 }.resolve(10).unwrap();
        let res = BloomFilter::open_params(&path, FilterParams { k: 0, ..good });
        assert!(matches!(res, Err(BloomError::InvalidParameters(_))));
        assert!(!path.exists());
    }
}
