//! Main copy command: scan, fan out to the worker pool, report

use crate::executor::{CopyOptions, CopyTask, OutcomeCallback, WorkerPool};
use crate::progress::{ProgressAggregator, ProgressSampler, ProgressSink};
use crate::scanner::{scan_directory, ScanOptions};
use crate::types::{CopyCatError, Summary};
use crate::ui::{DirectoryChooser, DirectoryRole};
use crate::Config;
use indicatif::HumanBytes;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ask `chooser` for source then destination, then run the copy.
///
/// A cancelled selection returns `CopyCatError::SelectionCancelled` before
/// anything is scanned or written.
pub fn run_selected(
    chooser: &dyn DirectoryChooser,
    config: &Config,
    sink: Arc<dyn ProgressSink>,
) -> Result<Summary, CopyCatError> {
    let source = chooser
        .choose_directory(DirectoryRole::Source)?
        .ok_or(CopyCatError::SelectionCancelled)?;
    let destination = chooser
        .choose_directory(DirectoryRole::Destination)?
        .ok_or(CopyCatError::SelectionCancelled)?;

    run(&source, &destination, config, sink)
}

/// Copy every regular file under `source` into `destination`.
///
/// Sequence: scan, create the destination root, start the pool and the
/// progress sampler, submit one task per file, drain, stop the sampler,
/// hand the summary to the sink. Per-file failures are counted in the
/// summary, not returned as errors.
///
/// # Errors
/// * `EmptySource` - nothing to copy; no pool is started and `sink` is
///   never called
/// * `InvalidDirectory` / `Config` - bad input
/// * `Io` / `Runtime` - the destination root or the pool could not be set up
pub fn run(
    source: &Path,
    destination: &Path,
    config: &Config,
    sink: Arc<dyn ProgressSink>,
) -> Result<Summary, CopyCatError> {
    config.validate()?;

    if !source.is_dir() {
        return Err(CopyCatError::InvalidDirectory {
            path: source.to_path_buf(),
            reason: "source is not a directory".to_string(),
        });
    }

    info!("Scanning {}", source.display());
    let scan = scan_directory(
        source,
        &ScanOptions {
            exclude: config.exclude.clone(),
        },
    )?;

    if scan.is_empty() {
        info!("No files to copy found in {}", source.display());
        return Err(CopyCatError::EmptySource {
            root: source.to_path_buf(),
        });
    }

    fs::create_dir_all(destination)?;
    let dest_root = fs::canonicalize(destination)?;
    if dest_root != scan.root() && dest_root.starts_with(scan.root()) {
        warn!(
            "Destination {} is inside the source tree; later runs will copy earlier copies",
            dest_root.display()
        );
    }

    let workers = config.worker_count();
    info!(
        files = scan.total_files(),
        bytes = scan.total_bytes(),
        workers,
        naming = ?config.naming,
        "Copying {} ({}) to {}",
        scan.root().display(),
        HumanBytes(scan.total_bytes()),
        dest_root.display()
    );

    let aggregator = Arc::new(ProgressAggregator::new(
        scan.total_files() as u64,
        scan.total_bytes(),
    ));
    let record: OutcomeCallback = {
        let aggregator = Arc::clone(&aggregator);
        Arc::new(move |outcome| aggregator.record(outcome))
    };

    // Both stop themselves on drop, covering every early return below
    let pool = WorkerPool::new(workers, config.drain_timeout, record)?;
    let sampler = ProgressSampler::start(
        Arc::clone(&aggregator),
        config.sample_interval,
        Arc::clone(&sink),
    )?;

    let options = CopyOptions::from(config);
    for entry in scan.iter() {
        pool.submit(CopyTask::new(
            entry.clone(),
            &dest_root,
            config.naming,
            options,
        ))?;
    }

    let stats = pool.drain();
    debug!(?stats, "Worker pool drained");
    sampler.stop();

    let summary = aggregator.summary();
    info!(
        copied = summary.files_copied,
        failed = summary.files_failed,
        cancelled = summary.files_cancelled,
        bytes = summary.bytes_copied,
        "{} in {:?}",
        summary.headline(),
        summary.elapsed
    );
    sink.on_complete(&summary);

    Ok(summary)
}
