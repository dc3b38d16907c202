//! Command-line interface

use super::{Config, NamingMode};
use crate::types::CopyCatError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Copy every file under SOURCE into DESTINATION, in parallel.
///
/// Missing directories are asked for interactively.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "copycat", version, about)]
pub struct Cli {
    /// Directory to copy from
    pub source: Option<PathBuf>,

    /// Directory to copy into (created if missing)
    pub destination: Option<PathBuf>,

    /// Put every file directly in DESTINATION as `<parent>.<name>`
    #[arg(long)]
    pub flatten: bool,

    /// Number of copy workers (default: CPUs x multiplier)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Workers per CPU when --threads is not given
    #[arg(long)]
    pub multiplier: Option<usize>,

    /// Progress refresh interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Give up on unfinished copies after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Skip files and directories matching this glob (repeatable)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Sync each file to disk before it is renamed into place
    #[arg(long)]
    pub fsync: bool,

    /// Keep source modification times
    #[arg(long)]
    pub preserve_mtime: bool,

    /// TOML config file (flags override its values)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Only log errors; hide the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl TryFrom<&Cli> for Config {
    type Error = CopyCatError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let mut config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if cli.flatten {
            config.naming = NamingMode::Flattened;
        }
        if cli.threads.is_some() {
            config.concurrency = cli.threads;
        }
        if let Some(multiplier) = cli.multiplier {
            config.concurrency_multiplier = multiplier;
        }
        if let Some(ms) = cli.interval_ms {
            config.sample_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = cli.timeout_secs {
            config.drain_timeout = Duration::from_secs(secs);
        }
        if !cli.exclude.is_empty() {
            config.exclude.extend(cli.exclude.iter().cloned());
        }
        config.fsync |= cli.fsync;
        config.preserve_mtime |= cli.preserve_mtime;

        config.validate()?;
        Ok(config)
    }
}
