//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// linkdrip: paced, crash-safe publishing of a link queue
#[derive(Parser, Debug)]
#[command(name = "linkdrip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drain the item queue: caption, tag, publish, mark, wait
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Region for trend lookups (answers the prompt)
    #[arg(long)]
    pub region: Option<String>,

    /// Tags attached to each item (answers the prompt)
    #[arg(long)]
    pub tags: Option<usize>,

    /// Seconds between published items (answers the prompt)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Path to the newline-delimited item file (answers the prompt)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Skip caption generation for this run
    #[arg(long)]
    pub no_enrichment: bool,

    /// Resume a saved run without asking
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
