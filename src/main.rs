use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use date_sort::pipeline::{self, RunSummary};
use date_sort::sink::{JsonLinesSink, RecordSink};
use date_sort::utils::{config, logging};
use date_sort::{Catalog, FileInspector, FileRecord};

const EXIT_BAD_SOURCE: u8 = 100;
const EXIT_BAD_DESTINATION: u8 = 101;

/// Index files from one folder into a catalog kept in another.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source folder (relative or full path)
    source: PathBuf,

    /// Destination folder (relative or full path); the catalog lives here
    destination: PathBuf,

    /// Print records as JSON lines instead of writing the catalog
    #[arg(long)]
    dryrun: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Inspector threads, overrides the config file
    #[arg(short, long)]
    workers: Option<usize>,

    /// Options file (defaults to date-sort.toml in the destination, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective options to date-sort.toml in the destination
    #[arg(long)]
    save_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.debug);
    debug!("Debug enabled, enjoy additional information.");

    if !args.source.is_dir() {
        error!("Source folder {:?} does not exist or is not a directory.", args.source);
        return ExitCode::from(EXIT_BAD_SOURCE);
    }
    if !args.destination.is_dir() {
        error!("Destination folder {:?} does not exist or is not a directory.", args.destination);
        return ExitCode::from(EXIT_BAD_DESTINATION);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let source = args.source.canonicalize().context("Failed to resolve source folder")?;
    let destination = args
        .destination
        .canonicalize()
        .context("Failed to resolve destination folder")?;

    let mut options = config::load_or_default(args.config.as_deref(), &destination)?;
    if let Some(workers) = args.workers {
        options.workers = workers;
    }
    if args.save_config {
        let path = destination.join(config::CONFIG_FILE_NAME);
        config::save_to_file(&path, &options)?;
        info!("Saved options to {:?}", path);
    }
    let inspector = FileInspector::default();

    info!("Source folder: {:?}", source);
    info!("Destination folder: {:?}", destination);

    if args.dryrun {
        info!("Dry run is enabled, no changes will be made.");
        let mut sink = JsonLinesSink::new(io::stdout().lock());
        let summary = pipeline::run(&source, &options, &inspector, &mut sink)?;
        sink.into_inner().flush().context("Failed to flush output")?;
        report_failures(&summary);
        return Ok(());
    }

    let db_path = destination.join(&options.catalog_name);
    info!("Using database: {:?}", db_path);

    let mut catalog = Catalog::open(&db_path).context("Failed to open catalog")?;
    catalog.initialize().context("Failed to initialize catalog")?;

    let summary = {
        let mut progress = Progress::new(&mut catalog);
        let result = pipeline::run(&source, &options, &inspector, &mut progress);
        progress.finish();
        result.context("Indexing aborted")?
    };
    report_failures(&summary);

    let stats = catalog.stats()?;
    info!(
        "Catalog holds {} files, {} of them duplicates",
        stats.files, stats.duplicates
    );
    catalog.close().context("Failed to close catalog")?;
    Ok(())
}

fn report_failures(summary: &RunSummary) {
    for failure in &summary.failures {
        warn!("Not indexed: {:?}: {}", failure.path, failure.error);
    }
    info!(
        "{} files indexed, {} could not be read",
        summary.accepted,
        summary.failures.len()
    );
}

/// Spinner around the catalog writer.
struct Progress<'a, S: RecordSink> {
    inner: &'a mut S,
    bar: ProgressBar,
}

impl<'a, S: RecordSink> Progress<'a, S> {
    fn new(inner: &'a mut S) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {pos} files {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { inner, bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl<S: RecordSink> RecordSink for Progress<'_, S> {
    fn accept(&mut self, record: FileRecord) -> date_sort::Result<()> {
        self.bar.set_message(record.filename.clone());
        self.inner.accept(record)?;
        self.bar.inc(1);
        Ok(())
    }
}
