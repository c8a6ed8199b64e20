//! CLI module for Streamfox
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Monitor a stream pool and play the best stream with failover
//! - `monitor` - Print the ranked pool after every probe round
//! - `probe` - Score a single stream once
//! - `discover` - List stream URLs found by crawling a page
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Play the best of two mirrors, crawling a page for more
//! streamfox watch https://a.example.com/live.m3u8 https://b.example.com/live.m3u8 \
//!     --seed https://example.com/watch
//!
//! # Ranked pool as JSON, one document per round
//! streamfox monitor --json https://a.example.com/live.m3u8
//!
//! # Generate shell completions
//! streamfox completions bash > ~/.bash_completion.d/streamfox
//! ```

pub mod completions;
pub mod config;
pub mod discover;
pub mod monitor;
pub mod output;
pub mod probe;
pub mod runtime;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Streamfox - quality-aware live stream failover
#[derive(Parser, Debug)]
#[command(
    name = "streamfox",
    version,
    about = "Quality-aware live stream pool with automatic playback failover"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor streams and play the best one, switching when it degrades
    Watch(WatchArgs),
    /// Print the ranked stream pool after every probe round
    Monitor(MonitorArgs),
    /// Probe a single stream once and print its score
    Probe(ProbeArgs),
    /// Crawl a page and list the stream URLs found
    Discover(DiscoverArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that reads the configuration file.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "streamfox.toml")]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STREAMFOX_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Where pool candidates come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Stream URLs, added to those listed in the configuration file
    pub urls: Vec<String>,

    /// Page to crawl for stream URLs (repeatable)
    #[arg(short, long = "seed")]
    pub seeds: Vec<String>,

    /// Seconds between probe rounds
    #[arg(short, long, env = "STREAMFOX_CHECK_INTERVAL")]
    pub interval: Option<f64>,

    /// Do not crawl seed pages, at startup or for replenishment
    #[arg(long)]
    pub no_discovery: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Score lead required before switching streams
    #[arg(short, long, env = "STREAMFOX_SWITCH_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Player binary to use instead of detecting mpv, vlc or ffplay
    #[arg(short, long)]
    pub player: Option<String>,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output as JSON (one document per round)
    #[arg(long)]
    pub json: bool,

    /// Exit after this many probe rounds
    #[arg(short = 'n', long)]
    pub rounds: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Stream URL to probe
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Page to crawl
    pub seed: String,

    /// Link depth to follow (overrides crawler.max_depth)
    #[arg(short, long)]
    pub depth: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "streamfox.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
