//! Summary - Final tally of a copy run

use super::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// One failed file, kept for the end-of-run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Final tally of a copy run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub files_copied: u64,
    /// Includes cancelled files
    pub files_failed: u64,
    pub files_cancelled: u64,
    pub bytes_copied: u64,
    pub total_files: u64,
    pub total_bytes: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
    pub failures: Vec<FailureRecord>,
}

impl Summary {
    /// True when every scanned file was copied
    pub fn is_complete(&self) -> bool {
        self.files_failed == 0 && self.files_copied == self.total_files
    }

    /// One-line human report, e.g. `2 files copied, 1 failed`
    pub fn headline(&self) -> String {
        let noun = if self.files_copied == 1 { "file" } else { "files" };
        format!(
            "{} {} copied, {} failed",
            self.files_copied, noun, self.files_failed
        )
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(copied: u64, failed: u64) -> Summary {
        Summary {
            files_copied: copied,
            files_failed: failed,
            files_cancelled: 0,
            bytes_copied: 30,
            total_files: copied + failed,
            total_bytes: 30,
            elapsed: Duration::from_millis(1250),
            started_at: Utc::now(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_headline_reports_failures() {
        assert_eq!(summary(2, 1).headline(), "2 files copied, 1 failed");
        assert_eq!(summary(1, 0).headline(), "1 file copied, 0 failed");
    }

    #[test]
    fn test_is_complete() {
        assert!(summary(2, 0).is_complete());
        assert!(!summary(2, 1).is_complete());
    }

    #[test]
    fn test_json_uses_millis() {
        let value = serde_json::to_value(summary(2, 0)).expect("serialize summary");
        assert_eq!(value["elapsed_ms"], 1250);
        assert_eq!(value["files_copied"], 2);
        assert!(value["started_at"].is_string());
    }
}
