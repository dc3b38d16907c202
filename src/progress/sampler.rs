//! Periodic sampler pushing snapshots to a sink

use super::{ProgressAggregator, ProgressSink};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::error;

/// Background thread that reads the aggregator every `interval` and pushes
/// the snapshot to the sink. It is the only writer to the sink while a
/// batch runs.
///
/// Stopping (explicitly or by drop) pushes one last snapshot and joins the
/// thread.
pub struct ProgressSampler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressSampler {
    pub fn start(
        aggregator: Arc<ProgressAggregator>,
        interval: Duration,
        sink: Arc<dyn ProgressSink>,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("copycat-sampler".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            sink.on_progress(&aggregator.snapshot());
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                sink.on_progress(&aggregator.snapshot());
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Push a final snapshot and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Err means the thread already exited
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Progress sampler thread panicked");
            }
        }
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressSnapshot;
    use crate::types::Summary;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        snapshots: Mutex<Vec<ProgressSnapshot>>,
        threads: Mutex<Vec<Option<String>>>,
    }

    impl ProgressSink for Recorder {
        fn on_progress(&self, snapshot: &ProgressSnapshot) {
            self.snapshots.lock().expect("lock snapshots").push(*snapshot);
            self.threads
                .lock()
                .expect("lock threads")
                .push(thread::current().name().map(str::to_string));
        }

        fn on_complete(&self, _summary: &Summary) {}
    }

    #[test]
    fn test_sampler_pushes_periodically_from_its_own_thread() {
        let aggregator = Arc::new(ProgressAggregator::new(1, 1));
        let recorder = Arc::new(Recorder::default());

        let sampler = ProgressSampler::start(
            Arc::clone(&aggregator),
            Duration::from_millis(10),
            recorder.clone(),
        )
        .expect("start sampler");
        thread::sleep(Duration::from_millis(80));
        sampler.stop();

        let count = recorder.snapshots.lock().expect("lock snapshots").len();
        assert!(count >= 2, "expected periodic pushes, got {}", count);
        assert!(recorder
            .threads
            .lock()
            .expect("lock threads")
            .iter()
            .all(|name| name.as_deref() == Some("copycat-sampler")));
    }

    #[test]
    fn test_stop_pushes_final_snapshot() {
        let aggregator = Arc::new(ProgressAggregator::new(1, 1));
        let recorder = Arc::new(Recorder::default());

        let sampler = ProgressSampler::start(
            Arc::clone(&aggregator),
            Duration::from_secs(3600),
            recorder.clone(),
        )
        .expect("start sampler");
        sampler.stop();

        assert_eq!(recorder.snapshots.lock().expect("lock snapshots").len(), 1);
    }

    #[test]
    fn test_drop_stops_sampler() {
        let aggregator = Arc::new(ProgressAggregator::new(1, 1));
        let recorder = Arc::new(Recorder::default());

        {
            let _sampler = ProgressSampler::start(
                Arc::clone(&aggregator),
                Duration::from_secs(3600),
                recorder.clone(),
            )
            .expect("start sampler");
        }

        let after_drop = recorder.snapshots.lock().expect("lock snapshots").len();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(
            recorder.snapshots.lock().expect("lock snapshots").len(),
            after_drop
        );
        assert_eq!(after_drop, 1);
    }
}
