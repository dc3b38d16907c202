//! ScanResult - Ordered list of files found under a scan root

use super::FileEntry;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of scanning a directory tree
///
/// Entries can only be appended through [`ScanResult::push`], which keeps
/// `total_bytes` equal to the sum of every entry's size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    root: PathBuf,
    files: Vec<FileEntry>,
    total_bytes: u64,
    total_dirs: usize,
    scan_duration: Duration,
}

impl ScanResult {
    /// Create a new empty ScanResult
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: Vec::new(),
            total_bytes: 0,
            total_dirs: 0,
            scan_duration: Duration::ZERO,
        }
    }

    /// Append a file entry, updating the byte total
    pub fn push(&mut self, entry: FileEntry) {
        self.total_bytes += entry.size;
        self.files.push(entry);
    }

    /// Root directory the scan started from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files in traversal order
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Sum of all file sizes
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of files found
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    /// Number of directories traversed below the root
    pub fn total_dirs(&self) -> usize {
        self.total_dirs
    }

    /// Time spent scanning
    pub fn scan_duration(&self) -> Duration {
        self.scan_duration
    }

    /// Check if no files were found
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterator over all entries in traversal order
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter()
    }

    pub(crate) fn increment_dirs(&mut self) {
        self.total_dirs += 1;
    }

    pub(crate) fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }
}
