use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber for the binaries.
///
/// `RUST_LOG` selects the filter (default `info`), e.g.
/// `RUST_LOG=school_calendar::providers=debug`. Output goes to stderr so the
/// CLI's stdout stays clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
