use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset: quiet wins over verbose.
pub fn default_directive(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "imgpress=debug"
    } else {
        "warn"
    }
}

/// Install the global tracing subscriber. Log lines go to stderr so that
/// `--json` output on stdout stays machine readable.
pub fn init(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
