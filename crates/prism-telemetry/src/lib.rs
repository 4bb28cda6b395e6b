//! Logging setup for Prism
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt
//! layer, human-readable or JSON.

use prism_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;

/// Filter used when neither the command line nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Resolve the effective filter directive
///
/// The command line wins over the config file, which wins over the default.
pub fn resolve_filter<'a>(cli: Option<&'a str>, config: &'a TelemetryConfig) -> &'a str {
    cli.or(config.log_filter.as_deref()).unwrap_or(DEFAULT_LOG_FILTER)
}

/// Build an `EnvFilter`, falling back to `info` for invalid directives
pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directive}': {e}, using '{DEFAULT_LOG_FILTER}'");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

/// Initialize logging
///
/// Logs go to stderr so command output on stdout stays machine-readable.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig, log_filter: Option<&str>) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(resolve_filter(log_filter, config));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry().with(filter).with(fmt_layer).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
