//! Aggregate progress tracking
//!
//! [`ProgressTracker`] owns the live [`TransferStats`] of one batch behind a
//! single `Mutex`, the only lock shared by the workers. Every mutation
//! happens inside that critical section, so `transferred_bytes` can only grow
//! and `files_completed` never passes `files_total`.
//!
//! An optional callback receives an immutable snapshot after each update. It
//! runs on the calling worker while the lock is held and must return quickly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cloudxfer_core::domain::TransferStats;

/// Progress observer invoked with a snapshot after every update
pub type ProgressCallback = Arc<dyn Fn(&TransferStats) + Send + Sync>;

/// Thread-safe accumulator for one batch
pub struct ProgressTracker {
    stats: Mutex<TransferStats>,
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("stats", &self.snapshot())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl ProgressTracker {
    /// Starts the batch clock
    pub fn new(total_bytes: u64, files_total: u32, callback: Option<ProgressCallback>) -> Self {
        Self {
            stats: Mutex::new(TransferStats::new(total_bytes, files_total)),
            callback,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TransferStats> {
        // Counters stay consistent even if a callback panicked mid-update
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut TransferStats)) {
        let mut stats = self.lock();
        apply(&mut stats);
        if let Some(callback) = &self.callback {
            let snapshot = *stats;
            callback(&snapshot);
        }
    }

    /// Records bytes moved for any file of the batch
    pub fn add_transferred(&self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        self.update(|stats| {
            stats.transferred_bytes = stats.transferred_bytes.saturating_add(bytes);
        });
    }

    /// Grows the expected total (downloads learn sizes as they start)
    pub fn add_expected(&self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        self.update(|stats| {
            stats.total_bytes = stats.total_bytes.saturating_add(bytes);
        });
    }

    /// Marks one file as finished, whatever its outcome
    pub fn complete_one(&self) {
        self.update(|stats| {
            if stats.files_completed < stats.files_total {
                stats.files_completed += 1;
            }
        });
    }

    /// Read-only copy of the current counters
    pub fn snapshot(&self) -> TransferStats {
        *self.lock()
    }
}
