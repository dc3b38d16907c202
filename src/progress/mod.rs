//! Progress aggregation and reporting seam

mod aggregator;
mod sampler;
mod snapshot;

pub use aggregator::ProgressAggregator;
pub use sampler::ProgressSampler;
pub use snapshot::ProgressSnapshot;

use crate::types::Summary;

/// Receives progress during a run and the summary at the end.
///
/// Implementations must return quickly; they are called from the sampler
/// thread on every tick.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    fn on_complete(&self, summary: &Summary);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}

    fn on_complete(&self, _summary: &Summary) {}
}
