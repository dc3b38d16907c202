//! Executor module: copy tasks and the worker pool that runs them

pub mod copy;
pub mod pool;

use crate::config::NamingMode;
use crate::types::{CopyFailure, CopyOutcome, FileEntry};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use copy::{copy_file_atomic, is_same_file, CopyOptions};
pub use pool::{OutcomeCallback, PoolStats, WorkerPool};

/// Compute where `entry` lands under `dest_root`.
///
/// * `Tree` - `dest_root/<relative path>`
/// * `Flattened` - `dest_root/<parent dir name>.<file name>`; when the parent
///   has no name the bare file name is used
pub fn destination_for(entry: &FileEntry, dest_root: &Path, naming: NamingMode) -> PathBuf {
    match naming {
        NamingMode::Tree => dest_root.join(&entry.relative_path),
        NamingMode::Flattened => {
            let file_name = entry
                .file_name()
                .map(OsString::from)
                .unwrap_or_else(|| entry.relative_path.clone().into_os_string());

            let flat_name = match entry.parent_dir_name() {
                Some(parent) => {
                    let mut name = OsString::from(parent);
                    name.push(".");
                    name.push(&file_name);
                    name
                }
                None => file_name,
            };

            dest_root.join(flat_name)
        }
    }
}

/// Copy one file to its computed destination.
///
/// Never returns an error: failures are folded into the outcome so a single
/// bad file cannot abort its siblings.
pub fn execute(
    entry: &FileEntry,
    dest_root: &Path,
    naming: NamingMode,
    options: &CopyOptions,
) -> CopyOutcome {
    let destination = destination_for(entry, dest_root, naming);
    copy_to(entry.clone(), destination, naming, options)
}

fn copy_to(
    entry: FileEntry,
    destination: PathBuf,
    naming: NamingMode,
    options: &CopyOptions,
) -> CopyOutcome {
    if naming == NamingMode::Tree {
        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create {}: {}", parent.display(), e);
                return CopyOutcome::failed(entry, destination, CopyFailure::from_io(&e));
            }
        }
    }

    if is_same_file(&entry.absolute_path, &destination) {
        debug!(
            "{} is already in place, not copying onto itself",
            destination.display()
        );
        let size = fs::metadata(&destination)
            .map(|m| m.len())
            .unwrap_or(entry.size);
        return CopyOutcome::succeeded(entry, destination, size);
    }

    match copy_file_atomic(&entry.absolute_path, &destination, options) {
        Ok(bytes) => {
            debug!(
                "Copied {} -> {} ({} bytes)",
                entry.absolute_path.display(),
                destination.display(),
                bytes
            );
            CopyOutcome::succeeded(entry, destination, bytes)
        }
        Err(e) => {
            warn!("Copy error {}: {}", entry.absolute_path.display(), e);
            CopyOutcome::failed(entry, destination, CopyFailure::from_io(&e))
        }
    }
}

/// Unit of work for the pool: one file bound to its destination
#[derive(Debug, Clone)]
pub struct CopyTask {
    entry: FileEntry,
    destination: PathBuf,
    naming: NamingMode,
    options: CopyOptions,
}

impl CopyTask {
    pub fn new(
        entry: FileEntry,
        dest_root: &Path,
        naming: NamingMode,
        options: CopyOptions,
    ) -> Self {
        let destination = destination_for(&entry, dest_root, naming);
        Self {
            entry,
            destination,
            naming,
            options,
        }
    }

    pub fn entry(&self) -> &FileEntry {
        &self.entry
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Run the copy, producing this task's single outcome
    pub fn execute(self) -> CopyOutcome {
        copy_to(self.entry, self.destination, self.naming, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;
    use tempfile::TempDir;

    fn entry_under(root: &Path, relative: &str, content: &[u8]) -> FileEntry {
        let absolute = root.join(relative);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).expect("create source parent");
        }
        fs::write(&absolute, content).expect("write source file");
        FileEntry::new(absolute, PathBuf::from(relative), content.len() as u64)
    }

    #[test]
    fn test_tree_destination() {
        let entry = FileEntry::new(
            PathBuf::from("/src/sub/b.txt"),
            PathBuf::from("sub/b.txt"),
            20,
        );
        assert_eq!(
            destination_for(&entry, Path::new("/dst"), NamingMode::Tree),
            PathBuf::from("/dst/sub/b.txt")
        );
    }

    #[test]
    fn test_flattened_destination() {
        let entry = FileEntry::new(
            PathBuf::from("/src/sub/b.txt"),
            PathBuf::from("sub/b.txt"),
            20,
        );
        assert_eq!(
            destination_for(&entry, Path::new("/dst"), NamingMode::Flattened),
            PathBuf::from("/dst/sub.b.txt")
        );
    }

    #[test]
    fn test_flattened_destination_for_top_level_file_uses_root_name() {
        let entry = FileEntry::new(PathBuf::from("/data/src/a.txt"), PathBuf::from("a.txt"), 1);
        assert_eq!(
            destination_for(&entry, Path::new("/dst"), NamingMode::Flattened),
            PathBuf::from("/dst/src.a.txt")
        );
    }

    #[test]
    fn test_execute_tree_creates_parents() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");
        let entry = entry_under(src.path(), "x/y/deep.txt", b"deep");

        let outcome = execute(&entry, dst.path(), NamingMode::Tree, &CopyOptions::default());

        assert!(outcome.success(), "outcome: {:?}", outcome.error);
        assert_eq!(outcome.bytes_written, 4);
        assert_eq!(
            fs::read(dst.path().join("x/y/deep.txt")).expect("read copy"),
            b"deep"
        );
    }

    #[test]
    fn test_execute_flattened_does_not_create_parents() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");
        let entry = entry_under(src.path(), "x/y/deep.txt", b"deep");
        let missing_root = dst.path().join("not-created");

        let outcome = execute(&entry, &missing_root, NamingMode::Flattened, &CopyOptions::default());

        assert!(!outcome.success());
        assert!(!missing_root.exists());
    }

    #[test]
    fn test_execute_overwrites_existing_destination() {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");
        let entry = entry_under(src.path(), "same.txt", b"new-data");
        fs::write(dst.path().join("same.txt"), b"old").expect("write stale copy");

        let outcome = execute(&entry, dst.path(), NamingMode::Tree, &CopyOptions::default());

        assert!(outcome.success());
        assert_eq!(
            fs::read(dst.path().join("same.txt")).expect("read copy"),
            b"new-data"
        );
    }

    #[test]
    fn test_execute_vanished_source_reports_failure() {
        let dst = TempDir::new().expect("create dst tempdir");
        let entry = FileEntry::new(
            dst.path().join("gone/missing.txt"),
            PathBuf::from("missing.txt"),
            10,
        );

        let outcome = execute(&entry, dst.path(), NamingMode::Tree, &CopyOptions::default());

        assert!(!outcome.success());
        assert_eq!(outcome.bytes_written, 0);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::SourceMissing));
    }

    #[test]
    fn test_execute_onto_itself_keeps_content() {
        let root = TempDir::new().expect("create tempdir");
        let entry = entry_under(root.path(), "sub/self.txt", b"keep me intact");

        let outcome = execute(&entry, root.path(), NamingMode::Tree, &CopyOptions::default());

        assert!(outcome.success());
        assert_eq!(outcome.bytes_written, 14);
        assert_eq!(
            fs::read(root.path().join("sub/self.txt")).expect("read file"),
            b"keep me intact"
        );
    }

    #[test]
    fn test_copy_task_precomputes_destination() {
        let entry = FileEntry::new(PathBuf::from("/s/d/f.bin"), PathBuf::from("d/f.bin"), 3);
        let task = CopyTask::new(
            entry.clone(),
            Path::new("/out"),
            NamingMode::Flattened,
            CopyOptions::default(),
        );

        assert_eq!(task.entry(), &entry);
        assert_eq!(task.destination(), Path::new("/out/d.f.bin"));
    }
}
