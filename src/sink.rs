//! Destinations for inspected records.
//!
//! The catalog is the usual sink. A planner that decides where files should
//! move would be another one; `--dryrun` streams records as JSON lines.

use std::io::{self, Write};
use std::path::Path;

use crate::database::catalog::Catalog;
use crate::error::{IndexError, Result};
use crate::ingest::inspector::FileRecord;

pub trait RecordSink {
    fn accept(&mut self, record: FileRecord) -> Result<()>;
}

impl RecordSink for Catalog {
    fn accept(&mut self, record: FileRecord) -> Result<()> {
        self.insert(&record).map(|_| ())
    }
}

impl RecordSink for Vec<FileRecord> {
    fn accept(&mut self, record: FileRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Writes one JSON object per record.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn accept(&mut self, record: FileRecord) -> Result<()> {
        let write = |w: &mut W| -> io::Result<()> {
            serde_json::to_writer(&mut *w, &record)?;
            w.write_all(b"\n")
        };
        write(&mut self.writer).map_err(|e| IndexError::io(Path::new("<output>"), e))
    }
}
