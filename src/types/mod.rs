//! Core type definitions for copycat

mod entry;
mod error;
mod outcome;
mod scan_result;
mod summary;

pub use entry::FileEntry;
pub use error::CopyCatError;
pub use outcome::{CopyFailure, CopyOutcome, FailureKind};
pub use scan_result::ScanResult;
pub use summary::{FailureRecord, Summary};
