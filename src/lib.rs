//! Indexing and cataloging engine for date-sort.
//!
//! Walks a source tree, fingerprints and classifies every regular file,
//! extracts timestamps from metadata and filenames, and records the result in
//! a SQLite catalog that tracks content duplicates.

pub mod database;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod sink;
pub mod utils;

pub use database::catalog::{Catalog, CatalogEntry, CatalogStats, DuplicateEntry, InsertOutcome};
pub use error::{IndexError, Result};
pub use ingest::inspector::{FileInspector, FileRecord};
pub use ingest::scanner::{index_folder, FileFailure, WalkReport};
pub use ingest::timestamp::{FilenameRule, FilenameRules, MediaType};
pub use sink::RecordSink;
pub use utils::config::IndexOptions;
