//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Reliable Dispatch - transactional enqueue onto a replicated queue
#[derive(Parser, Debug)]
#[command(
    name = "reliable-dispatch",
    author,
    version,
    about = "Transactional dispatcher for replicated queues",
    long_about = "Validates dispatcher configuration and drives the dispatcher against an \n\
                  in-memory store with configurable fault injection."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RELIABLE_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (overrides `observability.log_format`)
    #[arg(long, value_enum, global = true, env = "RELIABLE_DISPATCH_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Run the dispatcher against an in-memory store
    Simulate(SimulateArgs),
}

impl Commands {
    /// Configuration file the command reads
    pub fn config_path(&self) -> &Path {
        match self {
            Self::Validate(args) => &args.config,
            Self::Info(args) => &args.config,
            Self::Simulate(args) => &args.config,
        }
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "dispatch.toml",
        env = "RELIABLE_DISPATCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Override number of items to enqueue
    #[arg(long)]
    pub items: Option<u64>,

    /// Override number of concurrent callers
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Metrics server port (overrides configuration, 0 = disabled)
    #[arg(long, env = "RELIABLE_DISPATCH_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
