//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then command-line flags.

mod cli;

pub use cli::Cli;

use crate::types::CopyCatError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Upper bound on copy workers, explicit or derived from the CPU count
pub const MAX_WORKERS: usize = 1024;

/// How destination paths are derived from source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingMode {
    /// `dest/<relative path>`, mirroring the source hierarchy
    #[default]
    #[serde(alias = "tree_preserving")]
    Tree,

    /// `dest/<parent dir name>.<file name>`, all files in one directory
    Flattened,
}

/// Global configuration for a copy run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Destination naming policy
    pub naming: NamingMode,

    /// Explicit worker count; overrides the multiplier when set
    pub concurrency: Option<usize>,

    /// Workers per available CPU when `concurrency` is unset
    pub concurrency_multiplier: usize,

    /// How often progress snapshots are pushed to the sink
    pub sample_interval: Duration,

    /// Maximum wait for the pool to drain before cancelling the rest
    pub drain_timeout: Duration,

    /// Exclude patterns (globs, relative to the source root)
    pub exclude: Vec<String>,

    /// Sync each copied file to disk before renaming it into place
    pub fsync: bool,

    /// Copy the source modification time onto the destination
    pub preserve_mtime: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: NamingMode::Tree,
            concurrency: None,
            concurrency_multiplier: 2,
            sample_interval: Duration::from_secs(1),
            drain_timeout: Duration::from_secs(60 * 60),
            exclude: Vec::new(),
            fsync: false,
            preserve_mtime: false,
        }
    }
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    naming: Option<NamingMode>,
    concurrency: Option<usize>,
    concurrency_multiplier: Option<usize>,
    sample_interval_ms: Option<u64>,
    drain_timeout_secs: Option<u64>,
    exclude: Option<Vec<String>>,
    fsync: Option<bool>,
    preserve_mtime: Option<bool>,
}

impl Config {
    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(text: &str) -> Result<Self, CopyCatError> {
        let file: FileConfig = toml::from_str(text)
            .map_err(|e| CopyCatError::Config(format!("Invalid config file: {}", e)))?;

        let mut config = Config::default();
        config.apply_file(file);
        Ok(config)
    }

    /// Load a TOML config file on top of the defaults
    pub fn load(path: &Path) -> Result<Self, CopyCatError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CopyCatError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(naming) = file.naming {
            self.naming = naming;
        }
        if file.concurrency.is_some() {
            self.concurrency = file.concurrency;
        }
        if let Some(multiplier) = file.concurrency_multiplier {
            self.concurrency_multiplier = multiplier;
        }
        if let Some(ms) = file.sample_interval_ms {
            self.sample_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = file.drain_timeout_secs {
            self.drain_timeout = Duration::from_secs(secs);
        }
        if let Some(exclude) = file.exclude {
            self.exclude = exclude;
        }
        if let Some(fsync) = file.fsync {
            self.fsync = fsync;
        }
        if let Some(preserve_mtime) = file.preserve_mtime {
            self.preserve_mtime = preserve_mtime;
        }
    }

    /// Effective number of pool workers, between 1 and [`MAX_WORKERS`]
    pub fn worker_count(&self) -> usize {
        self.concurrency
            .unwrap_or_else(|| num_cpus::get().saturating_mul(self.concurrency_multiplier))
            .clamp(1, MAX_WORKERS)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CopyCatError> {
        if self.concurrency == Some(0) {
            return Err(CopyCatError::Config(
                "Concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(workers) = self.concurrency {
            if workers > MAX_WORKERS {
                return Err(CopyCatError::Config(format!(
                    "Concurrency must be at most {} (got {})",
                    MAX_WORKERS, workers
                )));
            }
        }

        if self.concurrency_multiplier == 0 {
            return Err(CopyCatError::Config(
                "Concurrency multiplier must be at least 1".to_string(),
            ));
        }

        if self.concurrency_multiplier > MAX_WORKERS {
            return Err(CopyCatError::Config(format!(
                "Concurrency multiplier must be at most {} (got {})",
                MAX_WORKERS, self.concurrency_multiplier
            )));
        }

        if self.sample_interval.is_zero() {
            return Err(CopyCatError::Config(
                "Sample interval must be greater than zero".to_string(),
            ));
        }

        if self.drain_timeout.is_zero() {
            return Err(CopyCatError::Config(
                "Drain timeout must be greater than zero".to_string(),
            ));
        }

        crate::scanner::compile_excludes(Path::new("."), &self.exclude)?;

        Ok(())
    }
}
