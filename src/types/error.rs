//! Error types for copycat

use std::path::PathBuf;
use thiserror::Error;

/// Error types for copycat operations
///
/// Per-file copy failures are not errors at this level: they travel as
/// [`CopyFailure`](super::CopyFailure) inside a `CopyOutcome` and never abort
/// a batch. This enum covers what stops a whole run.
#[derive(Debug, Error)]
pub enum CopyCatError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A chosen directory failed validation
    #[error("Invalid directory {path}: {reason}")]
    InvalidDirectory { path: PathBuf, reason: String },

    /// User aborted a directory picker
    #[error("Directory selection cancelled")]
    SelectionCancelled,

    /// Scan found no regular files under the source root
    #[error("No files to copy found in {root}")]
    EmptySource { root: PathBuf },

    /// Submission attempted after the worker pool was sealed
    #[error("Worker pool is sealed; no new tasks accepted")]
    PoolClosed,

    /// Worker runtime could not be built or driven
    #[error("Worker runtime error: {0}")]
    Runtime(String),
}

impl CopyCatError {
    /// Aborts that end the run cleanly (exit status 0).
    pub fn is_clean_abort(&self) -> bool {
        matches!(
            self,
            CopyCatError::SelectionCancelled | CopyCatError::EmptySource { .. }
        )
    }

    /// Check if this error comes from user-supplied configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CopyCatError::Config(_) | CopyCatError::InvalidDirectory { .. }
        )
    }
}
