//! Sequential depth-first directory walker

use crate::types::{CopyCatError, FileEntry, ScanResult};
use ignore::overrides::{Override, OverrideBuilder};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Options that shape a scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Globs for files and directories to leave out
    pub exclude: Vec<String>,
}

/// Compile exclude globs into an `ignore` override matcher rooted at `root`
pub fn compile_excludes(root: &Path, patterns: &[String]) -> Result<Override, CopyCatError> {
    let mut builder = OverrideBuilder::new(root);

    for pattern in patterns {
        // A leading ! turns an override glob into an exclusion
        builder.add(&format!("!{}", pattern)).map_err(|e| {
            CopyCatError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }

    builder
        .build()
        .map_err(|e| CopyCatError::Config(format!("Failed to build exclude overrides: {}", e)))
}

/// Scan every regular file under `root`.
///
/// Never fails: a missing or unreadable root yields an empty result.
pub fn scan(root: &Path) -> ScanResult {
    match scan_directory(root, &ScanOptions::default()) {
        Ok(result) => result,
        // Unreachable without exclude patterns
        Err(_) => ScanResult::new(root.to_path_buf()),
    }
}

/// Scan a directory tree depth-first and collect its regular files.
///
/// Files are visited in file-name order within each directory. Symbolic links
/// are skipped on every platform and never followed, as are FIFOs, sockets
/// and devices. Entries that vanish or become unreadable mid-scan are logged
/// and left out; nothing on disk is modified.
///
/// # Errors
/// * `CopyCatError::Config` if an exclude pattern is not a valid glob
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<ScanResult, CopyCatError> {
    let start_time = Instant::now();

    let root_path = match fs::canonicalize(root) {
        Ok(path) if path.is_dir() => path,
        Ok(_) => {
            warn!("Scan root {} is not a directory", root.display());
            return Ok(ScanResult::new(root.to_path_buf()));
        }
        Err(e) => {
            warn!("Scan root {} is not accessible: {}", root.display(), e);
            return Ok(ScanResult::new(root.to_path_buf()));
        }
    };

    let overrides = compile_excludes(&root_path, &options.exclude)?;
    let mut result = ScanResult::new(root_path.clone());

    let walker = ignore::WalkBuilder::new(&root_path)
        .standard_filters(false) // copy everything: hidden files, ignored files
        .follow_links(false)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error during directory traversal: {}. Continuing.", e);
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue,
        };

        if file_type.is_dir() {
            if entry.depth() > 0 {
                result.increment_dirs();
            }
            continue;
        }

        if file_type.is_symlink() {
            debug!("Skipping symlink {}", entry.path().display());
            continue;
        }

        if !file_type.is_file() {
            debug!("Skipping special file {}", entry.path().display());
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    "Failed to read metadata for {}: {}. File will be skipped.",
                    entry.path().display(),
                    e
                );
                continue;
            }
        };

        let relative_path = match entry.path().strip_prefix(&root_path) {
            Ok(p) => p.to_path_buf(),
            Err(_) => {
                warn!(
                    "Failed to calculate relative path for {}. File will be skipped.",
                    entry.path().display()
                );
                continue;
            }
        };

        result.push(FileEntry::new(
            entry.path().to_path_buf(),
            relative_path,
            metadata.len(),
        ));
    }

    result.set_scan_duration(start_time.elapsed());
    debug!(
        files = result.total_files(),
        bytes = result.total_bytes(),
        dirs = result.total_dirs(),
        "Scan of {} finished in {:?}",
        root_path.display(),
        result.scan_duration()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn relative_paths(result: &ScanResult) -> Vec<PathBuf> {
        result
            .iter()
            .map(|entry| entry.relative_path.clone())
            .collect()
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let result = scan(temp_dir.path());

        assert!(result.is_empty(), "Result should be empty");
        assert_eq!(result.total_files(), 0);
        assert_eq!(result.total_bytes(), 0);
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("does-not-exist");

        let result = scan(&missing);
        assert!(result.is_empty());
        assert_eq!(result.root(), missing.as_path());
    }

    #[test]
    fn test_scan_file_root_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, b"data").expect("Failed to write");

        assert!(scan(&file).is_empty());
    }

    #[test]
    fn test_scan_single_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root_path = temp_dir.path();

        let file_path = root_path.join("test.txt");
        let mut file = fs::File::create(&file_path).expect("Failed to create file");
        file.write_all(b"Hello, World!").expect("Failed to write");
        drop(file);

        let result = scan(root_path);
        assert_eq!(result.total_files(), 1, "Should have 1 file");
        assert_eq!(result.total_bytes(), 13, "Should have 13 bytes");

        let entry = &result.files()[0];
        assert_eq!(entry.relative_path, PathBuf::from("test.txt"));
        assert_eq!(entry.size, 13);
        assert!(entry.absolute_path.is_absolute());
        assert!(entry.absolute_path.ends_with("test.txt"));
    }

    #[test]
    fn test_scan_nested_directories_depth_first_sorted() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root_path = temp_dir.path();

        fs::create_dir_all(root_path.join("a/b")).expect("Failed to create dirs");
        fs::create_dir(root_path.join("c")).expect("Failed to create dir");
        fs::write(root_path.join("a/b/file.txt"), b"File 1").expect("Failed to write");
        fs::write(root_path.join("c/file2.txt"), b"File 2 content").expect("Failed to write");
        fs::write(root_path.join("z.txt"), b"z").expect("Failed to write");

        let result = scan(root_path);
        assert_eq!(result.total_files(), 3);
        assert_eq!(result.total_bytes(), 6 + 14 + 1);
        assert_eq!(result.total_dirs(), 3, "a, a/b and c");
        assert_eq!(
            relative_paths(&result),
            vec![
                PathBuf::from("a/b/file.txt"),
                PathBuf::from("c/file2.txt"),
                PathBuf::from("z.txt"),
            ]
        );
    }

    #[test]
    fn test_scan_includes_hidden_and_gitignored_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        fs::create_dir(root.join(".git")).expect("Failed to create .git dir");
        fs::write(root.join(".gitignore"), "*.log\n").expect("Failed to write .gitignore");
        fs::write(root.join("debug.log"), "log").expect("Failed to write debug.log");
        fs::write(root.join(".hidden"), "h").expect("Failed to write .hidden");

        let paths = relative_paths(&scan(root));
        assert!(paths.contains(&PathBuf::from("debug.log")));
        assert!(paths.contains(&PathBuf::from(".hidden")));
        assert!(paths.contains(&PathBuf::from(".gitignore")));
    }

    #[test]
    #[cfg(unix)]
    fn test_scan_skips_symlinks() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root_path = temp_dir.path();

        fs::write(root_path.join("target.txt"), b"Target content").expect("Failed to write");
        fs::create_dir(root_path.join("real_dir")).expect("Failed to create dir");
        fs::write(root_path.join("real_dir/inner.txt"), b"inner").expect("Failed to write");

        std::os::unix::fs::symlink(root_path.join("target.txt"), root_path.join("link.txt"))
            .expect("Failed to create file symlink");
        std::os::unix::fs::symlink(root_path.join("real_dir"), root_path.join("link_dir"))
            .expect("Failed to create dir symlink");
        std::os::unix::fs::symlink(root_path.join("nowhere"), root_path.join("broken"))
            .expect("Failed to create broken symlink");

        let result = scan(root_path);
        assert_eq!(
            relative_paths(&result),
            vec![PathBuf::from("real_dir/inner.txt"), PathBuf::from("target.txt")]
        );
        assert_eq!(result.total_bytes(), 5 + 14);
    }

    #[test]
    fn test_scan_respects_excludes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        fs::write(root.join("keep.txt"), "keep").expect("Failed to create keep.txt");
        fs::write(root.join("ignore.log"), "ignore").expect("Failed to create ignore.log");
        fs::create_dir(root.join("cache")).expect("Failed to create cache dir");
        fs::write(root.join("cache/data.txt"), "ignore").expect("Failed to create cache file");

        let options = ScanOptions {
            exclude: vec!["*.log".to_string(), "cache/".to_string()],
        };
        let result = scan_directory(root, &options).expect("scan should succeed");

        assert_eq!(relative_paths(&result), vec![PathBuf::from("keep.txt")]);
    }

    #[test]
    fn test_invalid_exclude_is_config_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let options = ScanOptions {
            exclude: vec!["[".to_string()],
        };

        let result = scan_directory(temp_dir.path(), &options);
        assert!(matches!(result, Err(CopyCatError::Config(_))));
    }

    #[test]
    fn test_scan_is_non_destructive() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::create_dir(root.join("sub")).expect("Failed to create dir");
        fs::write(root.join("sub/a.txt"), b"aaa").expect("Failed to write");

        let before = fs::read_dir(root).expect("read dir").count();
        let _ = scan(root);
        let after = fs::read_dir(root).expect("read dir").count();

        assert_eq!(before, after);
        assert_eq!(fs::read(root.join("sub/a.txt")).expect("read file"), b"aaa");
    }
}
