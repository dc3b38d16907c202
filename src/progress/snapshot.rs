//! Point-in-time view of copy progress

use std::time::Duration;

/// Read-only view of the shared counters at one instant.
///
/// Throughput, ETA and percent are derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub copied_bytes: u64,
    pub copied_files: u64,
    pub failed_files: u64,
    pub elapsed: Duration,
    pub total_bytes: u64,
    pub total_files: u64,
}

impl ProgressSnapshot {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// `floor(copied * 100 / total)`; an empty batch is complete.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let percent = u128::from(self.copied_bytes) * 100 / u128::from(self.total_bytes);
        percent.min(100) as u8
    }

    /// Bytes per second since the run started
    pub fn throughput_bps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.copied_bytes as f64 / secs
        } else {
            0.0
        }
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.copied_files as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time left; `None` until something has been copied.
    pub fn eta(&self) -> Option<Duration> {
        let throughput = self.throughput_bps();
        if throughput <= 0.0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.copied_bytes) as f64;
        Some(Duration::from_secs_f64(remaining / throughput))
    }

    /// Files that have produced an outcome, either way
    pub fn processed_files(&self) -> u64 {
        self.copied_files + self.failed_files
    }
}
