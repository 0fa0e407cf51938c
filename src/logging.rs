use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber
///
/// Logs go to stderr so stdout stays a clean JSON lines stream. `RUST_LOG`
/// overrides the default level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "nutrientdb=debug" } else { "nutrientdb=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
