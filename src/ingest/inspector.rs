use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::ingest::hasher;
use crate::ingest::timestamp::{FilenameRules, MediaType};

/// Everything learned about one file during indexing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub path: PathBuf,
    /// Lower-cased, without the leading dot. Empty when the file has none.
    pub extension: String,
    /// Hex SHA-256 of the file bytes.
    pub content_fingerprint: String,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
    pub filename_timestamp: Option<NaiveDateTime>,
    pub media_type: MediaType,
}

#[derive(Debug, Clone, Default)]
pub struct FileInspector {
    rules: FilenameRules,
}

impl FileInspector {
    pub fn new(rules: FilenameRules) -> Self {
        Self { rules }
    }

    /// Builds a complete record or fails; a record is never partially filled.
    pub fn inspect(&self, path: &Path) -> Result<FileRecord> {
        let path = std::path::absolute(path).map_err(|e| IndexError::io(path, e))?;

        let metadata = fs::metadata(&path).map_err(|e| IndexError::io(&path, e))?;
        if !metadata.is_file() {
            return Err(IndexError::io(
                &path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        // the catalog stores paths as text, so lossy names would collide
        if path.to_str().is_none() {
            return Err(IndexError::io(
                &path,
                io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
            ));
        }
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                IndexError::io(
                    &path,
                    io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        // creation time is not reported by every filesystem
        let created_at = metadata.created().ok().map(to_local);
        let modified_at = metadata.modified().ok().map(to_local);

        let media_type = MediaType::from_extension(&extension);
        let filename_timestamp = self.rules.parse(&filename)?;
        let content_fingerprint = hasher::calculate_hash(&path)?;

        debug!(
            path = %path.display(),
            fingerprint = %content_fingerprint,
            media_type = %media_type,
            "Inspected file"
        );

        Ok(FileRecord {
            filename,
            path,
            extension,
            content_fingerprint,
            created_at,
            modified_at,
            filename_timestamp,
            media_type,
        })
    }
}

fn to_local(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
