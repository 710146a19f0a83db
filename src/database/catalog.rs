use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::database::schema::{SCHEMA, TIMESTAMP_FORMAT};
use crate::error::{IndexError, Result};
use crate::ingest::inspector::FileRecord;
use crate::ingest::timestamp::MediaType;

/// A row of the `files` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: i64,
    pub filename: String,
    pub path: PathBuf,
    pub content_fingerprint: String,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
    pub media_type: MediaType,
}

/// A row of the `duplicates` table.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateEntry {
    pub id: i64,
    pub content_fingerprint: String,
    pub filename: String,
    pub path: PathBuf,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub entry_id: i64,
    /// Set when the fingerprint was already cataloged before this insert.
    pub duplicate_id: Option<i64>,
}

impl InsertOutcome {
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    pub files: u64,
    pub duplicates: u64,
}

/// SQLite catalog of indexed files and their content duplicates.
///
/// Owns a single connection. Every file is appended to `files`; a file whose
/// fingerprint was already present also gets a `duplicates` row, so the first
/// occurrence of a fingerprint is the only one absent from `duplicates`.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Opens (creating if needed) the catalog file. Call [`Catalog::initialize`]
    /// before inserting.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!("Opened catalog {:?}", path);
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Creates both tables if absent. Safe to call on every start.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Appends `record` to `files`, and to `duplicates` when its fingerprint
    /// was already cataloged. The lookup and both writes share one transaction.
    pub fn insert(&mut self, record: &FileRecord) -> Result<InsertOutcome> {
        check_record(record)?;

        let path = record_path(record)?;
        let created = record.created_at.map(format_timestamp);
        let modified = record.modified_at.map(format_timestamp);

        let tx = self.conn.transaction()?;

        let seen: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM files WHERE sha256 = ?1)",
            params![record.content_fingerprint],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO files (filename, path, sha256, created_timestamp, modified_timestamp, type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.filename,
                path,
                record.content_fingerprint,
                created,
                modified,
                record.media_type.as_str()
            ],
        )?;
        let entry_id = tx.last_insert_rowid();

        let duplicate_id = if seen {
            tx.execute(
                "INSERT INTO duplicates
                 (sha256, filename, path, created_timestamp, modified_timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![record.content_fingerprint, record.filename, path, created, modified],
            )?;
            Some(tx.last_insert_rowid())
        } else {
            None
        };

        tx.commit()?;

        if duplicate_id.is_some() {
            debug!("Duplicate content {} at {:?}", record.content_fingerprint, record.path);
        }
        Ok(InsertOutcome { entry_id, duplicate_id })
    }

    pub fn exists_by_name(&self, filename: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM files WHERE filename = ?1 LIMIT 1",
                params![filename],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM files WHERE sha256 = ?1 LIMIT 1",
                params![fingerprint],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Duplicate rows for `fingerprint` in insertion order, or `None` when
    /// there are none (the common case: the first occurrence is never a row here).
    pub fn duplicates_of(&self, fingerprint: &str) -> Result<Option<Vec<DuplicateEntry>>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sha256, filename, path, created_timestamp, modified_timestamp
             FROM duplicates WHERE sha256 = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![fingerprint], |row| {
                Ok(DuplicateEntry {
                    id: row.get(0)?,
                    content_fingerprint: row.get(1)?,
                    filename: row.get(2)?,
                    path: PathBuf::from(row.get::<_, String>(3)?),
                    created_at: timestamp_column(row, 4)?,
                    modified_at: timestamp_column(row, 5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(if rows.is_empty() { None } else { Some(rows) })
    }

    /// The first cataloged file with `fingerprint`.
    pub fn first_entry(&self, fingerprint: &str) -> Result<Option<CatalogEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, filename, path, sha256, created_timestamp, modified_timestamp, type
                 FROM files WHERE sha256 = ?1 ORDER BY id LIMIT 1",
                params![fingerprint],
                |row| {
                    let media: Option<String> = row.get(6)?;
                    let media_type = match media {
                        Some(text) => text.parse::<MediaType>().map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into())
                        })?,
                        None => MediaType::Unknown,
                    };
                    Ok(CatalogEntry {
                        id: row.get(0)?,
                        filename: row.get(1)?,
                        path: PathBuf::from(row.get::<_, String>(2)?),
                        content_fingerprint: row.get(3)?,
                        created_at: timestamp_column(row, 4)?,
                        modified_at: timestamp_column(row, 5)?,
                        media_type,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let count = |table: &str| -> rusqlite::Result<i64> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        };
        let files = count("files")?;
        let duplicates = count("duplicates")?;
        Ok(CatalogStats {
            files: files as u64,
            duplicates: duplicates as u64,
        })
    }

    /// Closes the connection, reporting failures. Dropping the catalog also
    /// closes it but swallows errors.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| IndexError::Storage(e))
    }
}

fn check_record(record: &FileRecord) -> Result<()> {
    if record.filename.is_empty() {
        return Err(IndexError::Programming("record has an empty filename".into()));
    }
    if record.path.as_os_str().is_empty() {
        return Err(IndexError::Programming(format!(
            "record '{}' has an empty path",
            record.filename
        )));
    }
    let fp = &record.content_fingerprint;
    if fp.len() != 64 || !fp.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(IndexError::Programming(format!(
            "record '{}' has a malformed fingerprint '{}'",
            record.filename, fp
        )));
    }
    Ok(())
}

fn record_path(record: &FileRecord) -> Result<&str> {
    record.path.to_str().ok_or_else(|| {
        IndexError::Programming(format!("record path {:?} is not valid UTF-8", record.path))
    })
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        NaiveDateTime::parse_from_str(&t, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
