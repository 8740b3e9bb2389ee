//! Error types for record storage.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write records to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record store lock poisoned")]
    Poisoned,
}
