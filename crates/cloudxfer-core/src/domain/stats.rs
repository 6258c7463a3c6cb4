//! Aggregate transfer statistics and human-readable formatting

use std::time::{Duration, Instant};

/// Progress counters of one batch
///
/// Instances handed to callers are read-only snapshots; the live copy is owned
/// by the engine's progress tracker. Speed and ETA are derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    pub total_bytes: u64,
    pub transferred_bytes: u64,
    pub start_time: Instant,
    pub files_completed: u32,
    pub files_total: u32,
}

impl TransferStats {
    /// Starts the clock now
    pub fn new(total_bytes: u64, files_total: u32) -> Self {
        Self {
            total_bytes,
            transferred_bytes: 0,
            start_time: Instant::now(),
            files_completed: 0,
            files_total,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Bytes per second since the batch started
    pub fn speed(&self) -> f64 {
        self.speed_over(self.elapsed())
    }

    /// Estimated time remaining
    pub fn eta(&self) -> Duration {
        self.eta_over(self.elapsed())
    }

    /// Speed for an explicit elapsed time; 0 when nothing has elapsed
    pub fn speed_over(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.transferred_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// ETA for an explicit elapsed time; zero when the speed is zero
    pub fn eta_over(&self, elapsed: Duration) -> Duration {
        let speed = self.speed_over(elapsed);
        if speed > 0.0 {
            let remaining = self.total_bytes.saturating_sub(self.transferred_bytes);
            Duration::from_secs_f64(remaining as f64 / speed)
        } else {
            Duration::ZERO
        }
    }

    /// Fraction of bytes done in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.transferred_bytes as f64 / self.total_bytes as f64).min(1.0)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.files_completed >= self.files_total
    }
}

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count as e.g. `1.50 MB`
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} PB")
}

/// Formats a rate as e.g. `2.00 MB/s`
pub fn format_speed(bytes_per_sec: f64) -> String {
    let mut speed = bytes_per_sec.max(0.0);
    for unit in SIZE_UNITS {
        if speed < 1024.0 {
            return format!("{speed:.2} {unit}/s");
        }
        speed /= 1024.0;
    }
    format!("{speed:.2} PB/s")
}

/// Formats a duration as `1h02m03s`, `2m05s` or `7s`
pub fn format_eta(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m:02}m{s:02}s")
    } else if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{s}s")
    }
}
