//! Atomic file copy implementation

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const BUFFER_SIZE: usize = 128 * 1024;

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-copy switches taken from the run configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Sync the staged file to disk before the rename
    pub fsync: bool,
    /// Copy the source modification time
    pub preserve_mtime: bool,
}

impl From<&crate::Config> for CopyOptions {
    fn from(config: &crate::Config) -> Self {
        Self {
            fsync: config.fsync,
            preserve_mtime: config.preserve_mtime,
        }
    }
}

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Stream `src` into a hidden staging file next to `dest`
/// 2. Optionally flush it to disk
/// 3. Apply source permissions (and mtime when asked)
/// 4. Rename over `dest`, replacing whatever is there
///
/// Staging names are unique per process and call, so concurrent copies that
/// target the same `dest` never interleave bytes: the last rename wins.
/// `dest`'s parent directory must already exist. On error the staging file
/// is removed.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
pub fn copy_file_atomic(src: &Path, dest: &Path, options: &CopyOptions) -> io::Result<u64> {
    let part_path = staging_path(dest);

    let result = stream_into(src, &part_path, options)
        .and_then(|bytes| fs::rename(&part_path, dest).map(|_| bytes));

    if result.is_err() {
        // Best effort; the staging file may never have been created
        let _ = fs::remove_file(&part_path);
    }

    result
}

fn stream_into(src: &Path, part_path: &Path, options: &CopyOptions) -> io::Result<u64> {
    let mut src_file = File::open(src)?;
    let src_metadata = src_file.metadata()?;
    let mut part_file = File::create(part_path)?;

    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = match src_file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        part_file.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
    }

    part_file.flush()?;
    if options.fsync {
        part_file.sync_all()?;
    }

    // Drop the handle before rename (required on Windows)
    drop(part_file);

    fs::set_permissions(part_path, src_metadata.permissions())?;

    if options.preserve_mtime {
        let mtime = filetime::FileTime::from_last_modification_time(&src_metadata);
        filetime::set_file_mtime(part_path, mtime)?;
    }

    Ok(total_bytes)
}

/// Hidden sibling of `dest`, unique per process and call.
///
/// The name does not embed the destination's file name, so a destination
/// near the file-name length limit still gets a valid staging name.
fn staging_path(dest: &Path) -> PathBuf {
    let seq = PART_COUNTER.fetch_add(1, Ordering::Relaxed);

    dest.with_file_name(format!(".{}-{}.copycat-part", std::process::id(), seq))
}

/// Check whether `a` and `b` are the same file on disk.
///
/// Returns false if either side does not exist.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        match (fs::metadata(a), fs::metadata(b)) {
            (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
            _ => false,
        }
    }

    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(ca), Ok(cb)) => ca == cb,
            _ => false,
        }
    }
}
