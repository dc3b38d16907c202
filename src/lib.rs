//! # copycat - Parallel Directory Copier
//!
//! Scans a source tree once, then copies every regular file into a
//! destination with a fixed pool of workers, reporting progress as it goes.
//!
//! Destination layout is either the source tree mirrored under the
//! destination root, or every file flattened into the root as
//! `<parent>.<name>`.

// Module declarations
pub mod commands;
pub mod config;
pub mod executor;
pub mod progress;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::{Config, NamingMode};
pub use types::{CopyCatError, CopyOutcome, FileEntry, ScanResult, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
