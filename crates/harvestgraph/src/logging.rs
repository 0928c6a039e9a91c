//! Logging setup.
//!
//! All diagnostics go to stderr; stdout belongs to the renderer's frame
//! buffer. Filtering follows the usual tracing env-filter syntax, sourced
//! from (in order) the `--log-level` flag, `HARVESTGRAPH_LOG`, `RUST_LOG`,
//! defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the default filter.
pub const LOG_ENV: &str = "HARVESTGRAPH_LOG";

/// Install the global subscriber. Call once, before any tracing macros.
pub fn init(level: Option<&str>) {
    let filter = match level {
        Some(spec) => EnvFilter::new(spec),
        None => EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        // The alternate screen is active for most of the process lifetime;
        // escape sequences in redirected stderr only add noise.
        .with_ansi(false)
        .init();
}
