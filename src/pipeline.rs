use std::path::{Path, PathBuf};
use std::thread;

use crossbeam::channel::bounded;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::ingest::inspector::{FileInspector, FileRecord};
use crate::ingest::scanner::{self, validate_root, FileFailure};
use crate::sink::RecordSink;
use crate::utils::config::IndexOptions;

const CHANNEL_CAPACITY: usize = 1024;

type Outcome<T> = std::result::Result<T, FileFailure>;

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Records handed to the sink
    pub accepted: usize,
    pub failures: Vec<FileFailure>,
}

/// Scanner thread -> `options.workers` inspector threads -> the calling
/// thread, which is the only one writing to `sink`.
///
/// The root is validated before any thread starts. Per-file failures are
/// collected; a sink error stops the run and is returned.
pub fn run<S: RecordSink + ?Sized>(
    root: &Path,
    options: &IndexOptions,
    inspector: &FileInspector,
    sink: &mut S,
) -> Result<RunSummary> {
    let root = validate_root(root)?;
    let root = root.as_path();
    let workers = options.workers.max(1);
    info!("Indexing {:?} with {} workers", root, workers);

    let (scan_tx, scan_rx) = bounded::<Outcome<PathBuf>>(CHANNEL_CAPACITY);
    let (record_tx, record_rx) = bounded::<Outcome<FileRecord>>(CHANNEL_CAPACITY);

    let summary = thread::scope(|s| {
        s.spawn(move || {
            debug!("Scanner started");
            if let Err(e) = scanner::scan_directory(root, options, scan_tx) {
                error!("Scanner failed: {}", e);
            }
            debug!("Scanner finished");
        });

        for i in 0..workers {
            let rx = scan_rx.clone();
            let tx = record_tx.clone();
            s.spawn(move || {
                debug!("Inspector {} started", i);
                for item in rx {
                    let outcome = item.and_then(|path| {
                        inspector
                            .inspect(&path)
                            .map_err(|error| FileFailure { path, error })
                    });
                    if tx.send(outcome).is_err() {
                        break;
                    }
                }
                debug!("Inspector {} finished", i);
            });
        }
        // Only the worker clones stay alive, so the channels close when they finish.
        drop(scan_rx);
        drop(record_tx);

        // Owned here so an early return closes the channel and unblocks the workers.
        let record_rx = record_rx;
        let mut summary = RunSummary::default();
        for outcome in record_rx.iter() {
            match outcome {
                Ok(record) => {
                    sink.accept(record)?;
                    summary.accepted += 1;
                }
                Err(failure) => {
                    warn!("Skipping {:?}: {}", failure.path, failure.error);
                    summary.failures.push(failure);
                }
            }
        }
        Ok::<_, crate::error::IndexError>(summary)
    })?;

    info!(
        "Indexed {} files, {} failures",
        summary.accepted,
        summary.failures.len()
    );
    Ok(summary)
}
