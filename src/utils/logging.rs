use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over the `--debug` default.
/// Logs go to stderr so dry-run output on stdout stays machine-readable.
pub fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
