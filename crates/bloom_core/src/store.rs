//! Bit storage backends: heap-resident and memory-mapped file.
//!
//! Bits are packed LSB-first: bit `i` is `bytes[i / 8] & (1 << (i % 8))`.
//! A mapped store's file holds exactly `ceil(n_bits / 8)` bytes and nothing
//! else, so heap and mapped stores with equal history are byte-identical.
use crate::consts::bytes_for_bits;
use crate::errors::{BloomError, Result};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::HeapBits {}
    impl Sealed for super::MappedBits {}
}

/// Fixed-length, set-only bit array. Implemented by [`HeapBits`] and
/// [`MappedBits`] only.
///
/// Indices must be `< len()`; out-of-range access panics.
pub trait BitStore: sealed::Sealed {
    fn len(&self) -> u64;
    fn get(&self, i: u64) -> bool;
    fn set(&mut self, i: u64);
    fn count_set(&self) -> u64;
    /// Push pending writes to stable storage (no-op for heap stores).
    fn flush(&self) -> Result<()>;
    fn as_bytes(&self) -> &[u8];
    /// Backing file, for persistent stores.
    fn path(&self) -> Option<&Path>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[inline]
fn locate(n_bits: u64, i: u64) -> (usize, u8) {
    assert!(i < n_bits, "bit index {i} out of range for {n_bits} bits");
    ((i / 8) as usize, 1u8 << (i & 7))
}

/// Set bits among the first `n_bits`; padding in the last byte is ignored.
#[inline]
fn popcount(bytes: &[u8], n_bits: u64) -> u64 {
    let full = (n_bits / 8) as usize;
    let whole: u64 = bytes[..full].iter().map(|b| b.count_ones() as u64).sum();
    match n_bits % 8 {
        0 => whole,
        tail => whole + (bytes[full] & ((1u8 << tail) - 1)).count_ones() as u64,
    }
}

fn byte_len(n_bits: u64) -> Result<usize> {
    usize::try_from(bytes_for_bits(n_bits))
        .map_err(|_| BloomError::InvalidParameters(format!("{n_bits} bits do not fit in memory")))
}

/// Owned, zero-initialized in-process bit array.
#[derive(Clone, Debug)]
pub struct HeapBits {
    n_bits: u64,
    bits: Vec<u8>,
}

impl HeapBits {
    pub fn new(n_bits: u64) -> Result<Self> {
        Ok(Self { n_bits, bits: vec![0u8; byte_len(n_bits)?] })
    }
}

impl BitStore for HeapBits {
    fn len(&self) -> u64 { self.n_bits }

    #[inline]
    fn get(&self, i: u64) -> bool {
        let (idx, mask) = locate(self.n_bits, i);
        self.bits[idx] & mask != 0
    }

    #[inline]
    fn set(&mut self, i: u64) {
        let (idx, mask) = locate(self.n_bits, i);
        self.bits[idx] |= mask;
    }

    fn count_set(&self) -> u64 { popcount(&self.bits, self.n_bits) }

    fn flush(&self) -> Result<()> { Ok(()) }

    fn as_bytes(&self) -> &[u8] { &self.bits }

    fn path(&self) -> Option<&Path> { None }
}

/// Bit array mapped read+write from a file.
///
/// The mapping lives as long as this value; writes reach the file through the
/// page cache and are only forced to disk by [`BitStore::flush`].
pub struct MappedBits {
    n_bits: u64,
    path: PathBuf,
    _f: File,
    mmap: MmapMut,
}

impl MappedBits {
    /// Open `path`, creating it at `ceil(n_bits / 8)` bytes if missing or empty.
    /// An existing non-empty file must already have exactly that length.
    pub fn open(path: impl AsRef<Path>, n_bits: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let want = byte_len(n_bits)?;
        if want == 0 {
            return Err(BloomError::InvalidParameters("cannot map an empty bit array".into()));
        }
        let f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| BloomError::storage(&path, e))?;
        let actual = f.metadata().map_err(|e| BloomError::storage(&path, e))?.len();
        if actual == 0 {
            f.set_len(want as u64).map_err(|e| BloomError::storage(&path, e))?;
            debug!(path = %path.display(), bytes = want, "created bit file");
        } else if actual != want as u64 {
            warn!(path = %path.display(), expected = want, actual, "bit file size mismatch");
            return Err(BloomError::SizeMismatch { expected: want as u64, actual });
        } else {
            debug!(path = %path.display(), bytes = want, "reusing bit file");
        }
        let mmap = unsafe { MmapOptions::new().len(want).map_mut(&f) }
            .map_err(|e| BloomError::storage(&path, e))?;
        Ok(Self { n_bits, path, _f: f, mmap })
    }
}

impl BitStore for MappedBits {
    fn len(&self) -> u64 { self.n_bits }

    #[inline]
    fn get(&self, i: u64) -> bool {
        let (idx, mask) = locate(self.n_bits, i);
        self.mmap[idx] & mask != 0
    }

    #[inline]
    fn set(&mut self, i: u64) {
        let (idx, mask) = locate(self.n_bits, i);
        self.mmap[idx] |= mask;
    }

    fn count_set(&self) -> u64 { popcount(&self.mmap, self.n_bits) }

    fn flush(&self) -> Result<()> {
        self.mmap.flush().map_err(|e| BloomError::storage(&self.path, e))
    }

    fn as_bytes(&self) -> &[u8] { &self.mmap }

    fn path(&self) -> Option<&Path> { Some(&self.path) }
}
