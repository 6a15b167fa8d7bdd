use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    /// Table-based sizing cannot satisfy the request; fall back to explicit sizing.
    #[error("unsupported parameters: error_rate={error_rate}, k={k}")]
    UnsupportedParameters { error_rate: f64, k: u32 },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("size mismatch: expected {expected} bytes, file has {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Bad manifest version {0}")]
    BadManifest(u16),
}

impl BloomError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BloomError::StorageUnavailable { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;
