use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Prism LLM adapter toolkit
#[derive(Debug, Parser)]
#[command(name = "prism", about = "Build, replay and send multi-vendor LLM requests")]
pub struct Args {
    /// Path to configuration file (defaults to `prism.toml` when present)
    #[arg(short, long, env = "PRISM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `prism_llm=debug`
    #[arg(long, env = "PRISM_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the vendor request for a canonical request, credentials redacted
    Request(RequestArgs),
    /// Feed a captured vendor response through the normalizer
    Replay(ReplayArgs),
    /// Send a canonical request and print the normalized result
    Complete(RequestArgs),
}

#[derive(Debug, ClapArgs)]
pub struct RequestArgs {
    /// Provider key to resolve the adapter with
    #[arg(short, long)]
    pub provider: String,

    /// Model id, overriding the one in the request file
    #[arg(short, long)]
    pub model: Option<String>,

    /// Canonical request as JSON
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Debug, ClapArgs)]
pub struct ReplayArgs {
    /// Provider key to resolve the adapter with
    #[arg(short, long)]
    pub provider: String,

    /// Captured vendor response body or stream
    #[arg(short, long)]
    pub input: PathBuf,

    /// Canonical request the capture answers; its options shape normalization
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    /// Treat the capture as a stream and feed it through the reassembler
    #[arg(long)]
    pub stream: bool,

    /// Stream records are JSON lines rather than server-sent events
    #[arg(long, requires = "stream")]
    pub json_lines: bool,

    /// Fragment size used to split a streamed capture
    #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u16).range(1..))]
    pub chunk_size: u16,
}
