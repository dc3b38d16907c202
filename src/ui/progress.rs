//! Terminal progress reporting

use crate::progress::{ProgressSink, ProgressSnapshot};
use crate::types::Summary;
use console::style;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Number of failures listed under the final line
const FAILURE_PREVIEW: usize = 3;

/// Progress bar sink: percent bar plus throughput, elapsed and ETA
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter drawing to stderr
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(100))
    }

    /// Reporter that draws nothing (quiet mode, non-terminal output)
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos:>3}% | {msg}") {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_message("Starting copy...");
        Self { bar }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(u64::from(snapshot.percent()));
        self.bar.set_message(format_progress_line(snapshot));
    }

    fn on_complete(&self, summary: &Summary) {
        let headline = if summary.files_failed == 0 {
            style(summary.headline()).green()
        } else {
            style(summary.headline()).yellow()
        };
        let throughput = if summary.elapsed.as_secs_f64() > 0.0 {
            (summary.bytes_copied as f64 / summary.elapsed.as_secs_f64()) as u64
        } else {
            0
        };

        self.bar.finish_with_message(format!(
            "{} | {} in {} | {}/s",
            headline,
            HumanBytes(summary.bytes_copied),
            format_clock(summary.elapsed),
            HumanBytes(throughput)
        ));

        for failure in summary.failures.iter().take(FAILURE_PREVIEW) {
            self.bar.println(format!(
                "  {} {}: {}",
                style("FAILED").red(),
                failure.path.display(),
                failure.message
            ));
        }
        if summary.failures.len() > FAILURE_PREVIEW {
            self.bar.println(format!(
                "  ... and {} more",
                summary.failures.len() - FAILURE_PREVIEW
            ));
        }
    }
}

/// `Speed | files/s | Elapsed | Remaining | copied / total`
pub fn format_progress_line(snapshot: &ProgressSnapshot) -> String {
    let remaining = snapshot
        .eta()
        .map(format_clock)
        .unwrap_or_else(|| "--".to_string());

    format!(
        "{}/s | {:.2} files/s | Elapsed {} | Remaining {} | {} / {}",
        HumanBytes(snapshot.throughput_bps() as u64),
        snapshot.files_per_second(),
        format_clock(snapshot.elapsed),
        remaining,
        HumanBytes(snapshot.copied_bytes),
        HumanBytes(snapshot.total_bytes)
    )
}

/// Format a duration as `HH:MM:SS`
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureKind, FailureRecord};
    use chrono::Utc;
    use std::path::PathBuf;

    fn snapshot(copied: u64, total: u64, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            copied_bytes: copied,
            copied_files: 1,
            failed_files: 0,
            elapsed,
            total_bytes: total,
            total_files: 2,
        }
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::ZERO), "00:00:00");
        assert_eq!(format_clock(Duration::from_secs(3723)), "01:02:03");
        assert_eq!(format_clock(Duration::from_millis(59_999)), "00:00:59");
    }

    #[test]
    fn test_progress_line_unknown_eta() {
        let line = format_progress_line(&snapshot(0, 1024, Duration::from_secs(1)));
        assert!(line.contains("Remaining --"));
        assert!(line.contains("Elapsed 00:00:01"));
    }

    #[test]
    fn test_progress_line_known_eta() {
        let line = format_progress_line(&snapshot(1024, 4096, Duration::from_secs(2)));
        assert!(line.contains("Remaining 00:00:06"));
        assert!(line.contains("1.00 KiB / 4.00 KiB"));
    }

    #[test]
    fn test_on_progress_moves_bar_to_percent() {
        let reporter = ProgressReporter::hidden();
        reporter.on_progress(&snapshot(50, 200, Duration::from_secs(1)));

        assert_eq!(reporter.bar.position(), 25);
        assert!(reporter.bar.message().contains("files/s"));
    }

    #[test]
    fn test_on_complete_reports_failures() {
        let reporter = ProgressReporter::hidden();
        let summary = Summary {
            files_copied: 2,
            files_failed: 1,
            files_cancelled: 0,
            bytes_copied: 30,
            total_files: 3,
            total_bytes: 40,
            elapsed: Duration::from_secs(1),
            started_at: Utc::now(),
            failures: vec![FailureRecord {
                path: PathBuf::from("c.txt"),
                kind: FailureKind::PermissionDenied,
                message: "denied".to_string(),
            }],
        };

        reporter.on_complete(&summary);

        assert!(reporter.bar.is_finished());
        assert!(reporter.bar.message().contains("2 files copied, 1 failed"));
    }
}
