//! Error kinds raised while indexing and cataloging files.
//!
//! Per-file kinds (`Io`, `Validation`) are collected by the walker and never
//! stop a run. `Configuration` and `Storage` abort the run. `Programming`
//! marks a caller bug.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Root or destination path is missing or not a directory
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single file could not be opened, read or stat'ed
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A filename timestamp pattern matched but is not a valid date/time
    #[error("Invalid timestamp in filename '{filename}': {reason}")]
    Validation { filename: String, reason: String },

    /// The catalog connection is unusable
    #[error("Catalog storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A malformed record was handed to the catalog
    #[error("Malformed record: {0}")]
    Programming(String),
}

impl IndexError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        IndexError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for errors scoped to one file, which the walker isolates.
    pub fn is_per_file(&self) -> bool {
        matches!(self, IndexError::Io { .. } | IndexError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
