//! Parallel transfer orchestration
//!
//! [`ParallelTransferOrchestrator::run_batch`] spawns exactly `workers` tokio
//! tasks. Each task claims the next unclaimed item through a shared atomic
//! cursor, runs it through a [`StreamTransferUnit`], and sends the outcome
//! over a channel to the aggregating caller. The pool lives only for the
//! duration of one batch.
//!
//! One bad file never aborts the batch: every item ends up in exactly one of
//! the `(succeeded, skipped, failed)` counts. Items whose worker died before
//! reporting are counted as failed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cloudxfer_core::config::TransferConfig;
use cloudxfer_core::domain::{
    BatchSummary, Direction, RemotePath, TransferItem, TransferOutcome, TransferStats,
};
use cloudxfer_core::ports::IRemoteStorage;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::progress::{ProgressCallback, ProgressTracker};
use crate::unit::StreamTransferUnit;

/// Outcome of one item, kept for reporting
#[derive(Debug, Clone)]
pub struct FileResult {
    pub item: TransferItem,
    pub outcome: TransferOutcome,
}

/// Everything a batch call reports back
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: BatchSummary,
    /// Final progress counters
    pub stats: TransferStats,
    /// Per-item outcomes in completion order
    pub results: Vec<FileResult>,
}

impl BatchReport {
    /// Items that ended in `Failed`
    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.results.iter().filter(|r| r.outcome.is_failed())
    }
}

/// Runs batches of transfers on a bounded worker pool
pub struct ParallelTransferOrchestrator {
    storage: Arc<dyn IRemoteStorage>,
    config: TransferConfig,
    on_progress: Option<ProgressCallback>,
}

impl ParallelTransferOrchestrator {
    pub fn new(storage: Arc<dyn IRemoteStorage>, config: TransferConfig) -> Self {
        Self {
            storage,
            config,
            on_progress: None,
        }
    }

    /// Installs a progress observer for subsequent batches
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Uploads local files into one remote folder
    ///
    /// Paths without a usable file name are counted as failed.
    pub async fn upload_files(&self, paths: &[PathBuf], remote_folder: &RemotePath) -> BatchReport {
        let mut items = Vec::with_capacity(paths.len());
        let mut rejected = Vec::new();
        for path in paths {
            match TransferItem::upload(path.clone(), remote_folder) {
                Ok(item) => items.push(item),
                Err(e) => rejected.push(FileResult {
                    item: TransferItem {
                        local_path: path.clone(),
                        remote_path: remote_folder.clone(),
                        direction: Direction::Upload,
                    },
                    outcome: TransferOutcome::Failed(e.to_string()),
                }),
            }
        }

        self.run_with_rejected(items, rejected).await
    }

    /// Downloads `(remote file, local path)` pairs
    pub async fn download_files(&self, pairs: Vec<(RemotePath, PathBuf)>) -> BatchReport {
        let items = pairs
            .into_iter()
            .map(|(remote, local)| TransferItem::download(remote, local))
            .collect();
        self.run_batch(items).await
    }

    /// Runs every item to a terminal outcome
    pub async fn run_batch(&self, items: Vec<TransferItem>) -> BatchReport {
        self.run_with_rejected(items, Vec::new()).await
    }

    /// Runs `items`; `rejected` entries already carry their failure but
    /// still count toward the batch totals
    async fn run_with_rejected(
        &self,
        items: Vec<TransferItem>,
        rejected: Vec<FileResult>,
    ) -> BatchReport {
        let files_total = count_u32(items.len() + rejected.len());
        let total_bytes = upload_bytes(&items).await;
        let workers = self.config.workers.max(1);

        info!(
            files = files_total,
            bytes = total_bytes,
            workers,
            mode = %self.config.duplicate_mode,
            "Starting batch"
        );

        let tracker = Arc::new(ProgressTracker::new(
            total_bytes,
            files_total,
            self.on_progress.clone(),
        ));
        let unit = Arc::new(StreamTransferUnit::new(
            Arc::clone(&self.storage),
            Arc::clone(&tracker),
            self.config,
        ));
        let items: Arc<[TransferItem]> = items.into();
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, TransferOutcome)>();

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let items = Arc::clone(&items);
            let cursor = Arc::clone(&cursor);
            let unit = Arc::clone(&unit);
            let tx = tx.clone();
            pool.spawn(async move {
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    let outcome = unit.transfer_one(item).await;
                    if tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut summary = BatchSummary::default();
        let mut reported = vec![false; items.len()];
        let mut results = Vec::with_capacity(items.len() + rejected.len());

        for result in rejected {
            log_outcome(&result.item, &result.outcome);
            summary.record(&result.outcome);
            tracker.complete_one();
            results.push(result);
        }

        while let Some((index, outcome)) = rx.recv().await {
            let item = &items[index];
            log_outcome(item, &outcome);
            summary.record(&outcome);
            reported[index] = true;
            results.push(FileResult {
                item: item.clone(),
                outcome,
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Transfer worker terminated abnormally");
            }
        }

        for (index, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
            let outcome = TransferOutcome::Failed("transfer worker terminated".to_string());
            let item = &items[index];
            log_outcome(item, &outcome);
            summary.record(&outcome);
            tracker.complete_one();
            results.push(FileResult {
                item: item.clone(),
                outcome,
            });
        }

        let stats = tracker.snapshot();
        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            bytes = stats.transferred_bytes,
            elapsed_ms = stats.elapsed().as_millis() as u64,
            "Batch complete"
        );

        BatchReport {
            summary,
            stats,
            results,
        }
    }
}

/// File counts are `u32`; batches beyond that saturate
fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn log_outcome(item: &TransferItem, outcome: &TransferOutcome) {
    let file = item.display_name();
    match outcome {
        TransferOutcome::Uploaded => info!(file = %file, remote = %item.remote_path, "Uploaded"),
        TransferOutcome::Downloaded => {
            info!(file = %file, local = %item.local_path.display(), "Downloaded")
        }
        TransferOutcome::Skipped(reason) => info!(file = %file, reason = %reason, "Skipped"),
        TransferOutcome::Failed(reason) => warn!(file = %file, reason = %reason, "Failed"),
    }
}

/// Sum of local sizes for upload items; files that vanished count as 0
async fn upload_bytes(items: &[TransferItem]) -> u64 {
    let mut total = 0u64;
    for item in items.iter().filter(|i| i.direction == Direction::Upload) {
        total += file_size(&item.local_path).await.unwrap_or(0);
    }
    total
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}
