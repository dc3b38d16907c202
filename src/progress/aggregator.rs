//! Shared progress counters fed by copy outcomes

use super::ProgressSnapshot;
use crate::types::{CopyOutcome, FailureKind, FailureRecord, Summary};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Thread-safe progress tracker using atomics.
///
/// Each counter only ever grows. Bytes and files are separate atomics, so a
/// snapshot may see one increment of a pair before the other, but never a
/// counter going backward.
#[derive(Debug)]
pub struct ProgressAggregator {
    total_files: u64,
    total_bytes: u64,
    copied_bytes: AtomicU64,
    copied_files: AtomicU64,
    failed_files: AtomicU64,
    cancelled_files: AtomicU64,
    failures: Mutex<Vec<FailureRecord>>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl ProgressAggregator {
    /// Start the clock for a batch of `total_files` files / `total_bytes` bytes.
    pub fn new(total_files: u64, total_bytes: u64) -> Self {
        Self {
            total_files,
            total_bytes,
            copied_bytes: AtomicU64::new(0),
            copied_files: AtomicU64::new(0),
            failed_files: AtomicU64::new(0),
            cancelled_files: AtomicU64::new(0),
            failures: Mutex::new(Vec::new()),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Fold one outcome into the counters. Call exactly once per outcome.
    pub fn record(&self, outcome: CopyOutcome) {
        match outcome.error {
            None => {
                self.copied_bytes
                    .fetch_add(outcome.bytes_written, Ordering::SeqCst);
                self.copied_files.fetch_add(1, Ordering::SeqCst);
            }
            Some(failure) => {
                self.failed_files.fetch_add(1, Ordering::SeqCst);
                if failure.kind == FailureKind::Cancelled {
                    self.cancelled_files.fetch_add(1, Ordering::SeqCst);
                }
                self.failures
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(FailureRecord {
                        path: outcome.entry.relative_path,
                        kind: failure.kind,
                        message: failure.message,
                    });
            }
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            copied_bytes: self.copied_bytes.load(Ordering::SeqCst),
            copied_files: self.copied_files.load(Ordering::SeqCst),
            failed_files: self.failed_files.load(Ordering::SeqCst),
            elapsed: self.started.elapsed(),
            total_bytes: self.total_bytes,
            total_files: self.total_files,
        }
    }

    /// Final tally. Failure records come back in path order.
    pub fn summary(&self) -> Summary {
        let snapshot = self.snapshot();
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        Summary {
            files_copied: snapshot.copied_files,
            files_failed: snapshot.failed_files,
            files_cancelled: self.cancelled_files.load(Ordering::SeqCst),
            bytes_copied: snapshot.copied_bytes,
            total_files: self.total_files,
            total_bytes: self.total_bytes,
            elapsed: snapshot.elapsed,
            started_at: self.started_at,
            failures,
        }
    }
}
