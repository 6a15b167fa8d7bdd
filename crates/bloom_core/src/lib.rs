pub mod consts;
pub mod errors;
pub mod utils;
pub mod hash;
pub mod table;
pub mod store;
pub mod sizing;
pub mod filter;
pub mod manifest;

pub use errors::{BloomError, Result};
pub use filter::{BloomFilter, FilterStats};
pub use hash::{expand, Blake3Hasher, SeededHasher, Xxh3Hasher};
pub use manifest::FilterManifest;
pub use sizing::{FilterParams, Sizing};
pub use store::{BitStore, HeapBits, MappedBits};
