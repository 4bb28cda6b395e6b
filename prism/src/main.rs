#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use std::path::{Path, PathBuf};

use args::{Args, Command};
use clap::Parser;
use prism_config::{Config, TelemetryConfig};
use prism_llm::AdapterRegistry;

/// Config file picked up from the working directory when none is given
const DEFAULT_CONFIG_PATH: &str = "prism.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    let default_telemetry = TelemetryConfig::default();
    let telemetry = config.as_ref().map_or(&default_telemetry, |c| &c.telemetry);
    prism_telemetry::init(telemetry, args.log_filter.as_deref())?;

    let registry = config
        .as_ref()
        .map_or_else(AdapterRegistry::with_defaults, |c| AdapterRegistry::from_config(&c.llm));
    tracing::debug!(providers = ?registry.keys().collect::<Vec<_>>(), "adapter registry ready");

    let context = commands::Context {
        config: config.as_ref(),
        registry: &registry,
    };

    match args.command {
        Command::Request(request) => commands::request(&context, &request),
        Command::Replay(replay) => commands::replay(&context, &replay),
        Command::Complete(request) => commands::complete(&context, &request).await,
    }
}

/// Load the explicit config, or `prism.toml` when it exists
///
/// Without either, the registry falls back to the built-in provider keys.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Option<Config>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !fallback.exists() {
                return Ok(None);
            }
            fallback
        }
    };

    Config::load(&path).map(Some)
}
