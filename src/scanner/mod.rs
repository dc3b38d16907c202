//! Directory scanning logic

mod walker;

pub use walker::{compile_excludes, scan, scan_directory, ScanOptions};
