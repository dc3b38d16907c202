//! FileEntry - A regular file found by the scanner

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A regular file discovered under a scan root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the source file
    pub absolute_path: PathBuf,

    /// Path relative to the scan root
    pub relative_path: PathBuf,

    /// File size in bytes at scan time
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry
    pub fn new(absolute_path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        Self {
            absolute_path,
            relative_path,
            size,
        }
    }

    /// Final component of the file's path
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.absolute_path.file_name()
    }

    /// Name of the directory that immediately contains this file.
    ///
    /// For files directly under the scan root this is the root's own name.
    /// Returns `None` when the parent has no name (a filesystem root).
    pub fn parent_dir_name(&self) -> Option<&std::ffi::OsStr> {
        self.absolute_path.parent().and_then(Path::file_name)
    }
}
