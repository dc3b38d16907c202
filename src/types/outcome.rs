//! CopyOutcome - Result of executing one copy task

use super::FileEntry;
use serde::{Deserialize, Serialize};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;

/// Why a single file failed to copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Source unreadable or destination unwritable
    PermissionDenied,

    /// Destination filesystem ran out of space
    DiskFull,

    /// Source vanished after the scan
    SourceMissing,

    /// Any other I/O error
    Io,

    /// Task never finished because the drain timeout expired
    Cancelled,
}

impl FailureKind {
    /// Classify an I/O error
    pub fn from_io(error: &Error) -> Self {
        match error.kind() {
            ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
            ErrorKind::NotFound => FailureKind::SourceMissing,
            // ENOSPC (28) on Unix, ERROR_DISK_FULL (112) on Windows
            ErrorKind::StorageFull => FailureKind::DiskFull,
            _ if matches!(error.raw_os_error(), Some(28 | 112)) => FailureKind::DiskFull,
            _ => FailureKind::Io,
        }
    }

    /// True for every kind except `Cancelled`
    pub fn is_io_failure(self) -> bool {
        !matches!(self, FailureKind::Cancelled)
    }

    pub fn label(self) -> &'static str {
        match self {
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::DiskFull => "disk full",
            FailureKind::SourceMissing => "source missing",
            FailureKind::Io => "io error",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

/// Failure details carried by a failed outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CopyFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build a failure from an I/O error, classifying it
    pub fn from_io(error: &Error) -> Self {
        Self::new(FailureKind::from_io(error), error.to_string())
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "drain timeout expired before the copy finished")
    }
}

/// Outcome of one copy task, consumed exactly once by the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// The file this outcome is about
    pub entry: FileEntry,

    /// Computed destination path
    pub destination: PathBuf,

    /// Bytes written to the destination (0 on failure)
    pub bytes_written: u64,

    /// Failure details, `None` on success
    pub error: Option<CopyFailure>,
}

impl CopyOutcome {
    pub fn succeeded(entry: FileEntry, destination: PathBuf, bytes_written: u64) -> Self {
        Self {
            entry,
            destination,
            bytes_written,
            error: None,
        }
    }

    pub fn failed(entry: FileEntry, destination: PathBuf, failure: CopyFailure) -> Self {
        Self {
            entry,
            destination,
            bytes_written: 0,
            error: Some(failure),
        }
    }

    pub fn cancelled(entry: FileEntry, destination: PathBuf) -> Self {
        Self::failed(entry, destination, CopyFailure::cancelled())
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|failure| failure.kind)
    }
}
