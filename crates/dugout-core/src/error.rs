// Errors raised while loading or saving the persisted store.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but is not a valid store document. Never degraded to an
    /// empty store.
    #[error("data integrity error: {path} is not a valid store document: {source}")]
    DataIntegrity {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize store: {source}")]
    Serialize { source: serde_json::Error },

    #[error("no path given and the container is not bound to one")]
    Unbound,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
