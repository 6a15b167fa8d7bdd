use crate::consts::{MANIFEST_SUFFIX, MANIFEST_VERSION};
use crate::errors::{BloomError, Result};
use crate::sizing::FilterParams;
use crate::utils::fsync_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Side-car description of a persistent filter's bit file.
///
/// The bit file itself is headerless; this records what it takes to reopen it
/// with the same layout. Lives next to the bit file as `<bits>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterManifest {
    pub version: u16,
    pub hasher: String,
    pub params: FilterParams,
}

impl FilterManifest {
    pub fn new(params: FilterParams, hasher: &str) -> Self {
        Self { version: MANIFEST_VERSION, hasher: hasher.to_string(), params }
    }

    /// `<bits>.json` for a bit file path.
    pub fn path_for(bits: &Path) -> PathBuf {
        let mut name = bits.as_os_str().to_owned();
        name.push(".");
        name.push(MANIFEST_SUFFIX);
        PathBuf::from(name)
    }

    /// Load the manifest for `bits`, or `None` if it has none yet.
    pub fn load(bits: &Path) -> Result<Option<Self>> {
        let p = Self::path_for(bits);
        if !p.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&p)?;
        let m: FilterManifest = serde_json::from_str(&s)?;
        if m.version != MANIFEST_VERSION {
            return Err(BloomError::BadManifest(m.version));
        }
        m.params.validate()?;
        Ok(Some(m))
    }

    /// Write via tmp file + rename.
    pub fn save_atomic(&self, bits: &Path) -> Result<()> {
        let p = Self::path_for(bits);
        let mut tmp = p.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let mut f = fs::File::create(&tmp)?;
        f.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        f.sync_all()?;
        drop(f);
        fs::rename(&tmp, &p)?;
        let _ = fsync_dir(&p);
        Ok(())
    }
}
