//! Fixed-size worker pool for copy tasks.
//!
//! - one shared upstream queue; every worker pulls its next task from it
//! - blocking file I/O runs on tokio's blocking pool, capped at the worker count
//! - a ledger of outstanding tasks guarantees exactly one outcome per task
//! - sealing drops the sender; drain waits for workers up to a deadline, then
//!   aborts them and reports every unfinished task as cancelled

use super::CopyTask;
use crate::config::MAX_WORKERS;
use crate::types::{CopyCatError, CopyFailure, CopyOutcome, FailureKind, FileEntry};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Receives every outcome the pool produces, from worker threads.
pub type OutcomeCallback = Arc<dyn Fn(CopyOutcome) + Send + Sync>;

type QueuedTask = (usize, CopyTask);

/// Runtime stats for a pool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub enqueued: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub per_worker_completed: Vec<usize>,
}

impl PoolStats {
    fn new(workers: usize) -> Self {
        Self {
            workers,
            enqueued: 0,
            completed: 0,
            cancelled: 0,
            per_worker_completed: vec![0; workers],
        }
    }
}

/// Submitted tasks that have not produced an outcome yet.
///
/// Publishing happens under the lock, so a worker finishing late and the
/// cancellation sweep can never both report the same task.
#[derive(Default)]
struct Ledger {
    outstanding: StdMutex<HashMap<usize, (FileEntry, PathBuf)>>,
}

impl Ledger {
    fn lock(&self) -> MutexGuard<'_, HashMap<usize, (FileEntry, PathBuf)>> {
        self.outstanding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open(&self, id: usize, task: &CopyTask) {
        self.lock().insert(
            id,
            (task.entry().clone(), task.destination().to_path_buf()),
        );
    }

    fn forget(&self, id: usize) {
        self.lock().remove(&id);
    }

    /// Publish the outcome for `id` if nobody has yet.
    fn settle<F>(&self, id: usize, on_outcome: &OutcomeCallback, make: F) -> bool
    where
        F: FnOnce(FileEntry, PathBuf) -> CopyOutcome,
    {
        let mut outstanding = self.lock();
        match outstanding.remove(&id) {
            Some((entry, destination)) => {
                on_outcome(make(entry, destination));
                true
            }
            None => false,
        }
    }

    /// Publish a cancelled outcome for every remaining task, in submission order.
    fn cancel_all(&self, on_outcome: &OutcomeCallback) -> usize {
        let mut outstanding = self.lock();
        let mut leftovers: Vec<_> = outstanding.drain().collect();
        leftovers.sort_by_key(|(id, _)| *id);

        let count = leftovers.len();
        for (_, (entry, destination)) in leftovers {
            on_outcome(CopyOutcome::cancelled(entry, destination));
        }
        count
    }
}

/// Bounded pool of copy workers.
pub struct WorkerPool {
    runtime: Option<Runtime>,
    queue_tx: Option<mpsc::UnboundedSender<QueuedTask>>,
    worker_handles: Vec<JoinHandle<()>>,
    ledger: Arc<Ledger>,
    stats: Arc<StdMutex<PoolStats>>,
    on_outcome: OutcomeCallback,
    drain_timeout: Duration,
    next_id: AtomicUsize,
}

impl WorkerPool {
    /// Start `worker_count` workers (at least one) that publish to `on_outcome`.
    pub fn new(
        worker_count: usize,
        drain_timeout: Duration,
        on_outcome: OutcomeCallback,
    ) -> Result<Self, CopyCatError> {
        if worker_count > MAX_WORKERS {
            return Err(CopyCatError::Config(format!(
                "Worker count must be at most {} (got {})",
                MAX_WORKERS, worker_count
            )));
        }
        let workers = worker_count.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers.min(num_cpus::get()).max(1))
            .max_blocking_threads(workers)
            .thread_name("copycat-worker")
            .enable_all()
            .build()
            .map_err(|e| CopyCatError::Runtime(format!("failed to start worker runtime: {}", e)))?;

        let stats = Arc::new(StdMutex::new(PoolStats::new(workers)));
        let ledger = Arc::new(Ledger::default());
        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<QueuedTask>();
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let worker_handles = (0..workers)
            .map(|worker_id| {
                runtime.spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue_rx),
                    Arc::clone(&ledger),
                    Arc::clone(&on_outcome),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        debug!(workers, ?drain_timeout, "Worker pool started");

        Ok(Self {
            runtime: Some(runtime),
            queue_tx: Some(queue_tx),
            worker_handles,
            ledger,
            stats,
            on_outcome,
            drain_timeout,
            next_id: AtomicUsize::new(0),
        })
    }

    /// Queue a task. Fails once the pool is sealed.
    pub fn submit(&self, task: CopyTask) -> Result<(), CopyCatError> {
        let sender = self.queue_tx.as_ref().ok_or(CopyCatError::PoolClosed)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.ledger.open(id, &task);
        if sender.send((id, task)).is_err() {
            self.ledger.forget(id);
            return Err(CopyCatError::PoolClosed);
        }

        lock_stats(&self.stats).enqueued += 1;
        Ok(())
    }

    /// Stop accepting tasks. Queued tasks still run.
    pub fn seal(&mut self) {
        self.queue_tx.take();
    }

    pub fn is_sealed(&self) -> bool {
        self.queue_tx.is_none()
    }

    /// Seal, then block until every task has an outcome or the drain
    /// timeout expires. Past the deadline, workers are aborted and every task
    /// still outstanding is published as cancelled. In-flight copies are not
    /// rolled back.
    pub fn drain(mut self) -> PoolStats {
        self.seal();

        let handles = std::mem::take(&mut self.worker_handles);
        let Some(runtime) = self.runtime.take() else {
            return lock_stats(&self.stats).clone();
        };

        let abort_handles: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let drain_timeout = self.drain_timeout;

        let drained = runtime.block_on(async move {
            tokio::time::timeout(drain_timeout, async move {
                for handle in handles {
                    if let Err(e) = handle.await {
                        error!("Copy worker failed: {}", e);
                    }
                }
            })
            .await
            .is_ok()
        });

        if !drained {
            error!(
                "Drain timeout of {:?} expired; cancelling outstanding copies",
                drain_timeout
            );
            for handle in &abort_handles {
                handle.abort();
            }
        }

        // Also catches tasks orphaned by a panicking worker
        let cancelled = self.ledger.cancel_all(&self.on_outcome);

        // Blocked copies cannot be interrupted; leave their threads behind
        runtime.shutdown_background();

        let mut stats = lock_stats(&self.stats);
        stats.cancelled += cancelled;
        stats.clone()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue_tx.take();
        if let Some(runtime) = self.runtime.take() {
            for handle in &self.worker_handles {
                handle.abort();
            }
            runtime.shutdown_background();
        }
    }
}

fn lock_stats(stats: &StdMutex<PoolStats>) -> MutexGuard<'_, PoolStats> {
    stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<QueuedTask>>>,
    ledger: Arc<Ledger>,
    on_outcome: OutcomeCallback,
    stats: Arc<StdMutex<PoolStats>>,
) {
    loop {
        let next = {
            let mut queue = queue.lock().await;
            queue.recv().await
        };
        let Some((id, task)) = next else {
            break;
        };

        let published = match tokio::task::spawn_blocking(move || task.execute()).await {
            Ok(outcome) => ledger.settle(id, &on_outcome, |_, _| outcome),
            Err(e) => {
                error!("Copy task {} did not finish: {}", id, e);
                ledger.settle(id, &on_outcome, |entry, destination| {
                    CopyOutcome::failed(
                        entry,
                        destination,
                        CopyFailure::new(FailureKind::Io, format!("copy task failed: {}", e)),
                    )
                })
            }
        };

        if published {
            let mut stats = lock_stats(&stats);
            stats.completed += 1;
            if let Some(slot) = stats.per_worker_completed.get_mut(worker_id) {
                *slot += 1;
            }
        }
    }
    // Queue sealed and empty
}
