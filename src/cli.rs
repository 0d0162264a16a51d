// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `seqdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seqdag",
    version,
    about = "Plan and run peak calling, variant calling and hub generation from a sample design.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Seqdag.toml")]
    pub config: String,

    /// Design sheet (CSV). Overrides `[project].design`.
    #[arg(long, value_name = "PATH")]
    pub design: Option<String>,

    /// Build only these targets (task names or output paths) and what they need.
    ///
    /// May be given more than once. Without it, every planned task is built.
    #[arg(long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Maximum number of tasks running at the same time.
    ///
    /// If omitted, `[config].jobs` is used.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Run tasks even if their outputs are up to date.
    #[arg(long)]
    pub force: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEQDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
