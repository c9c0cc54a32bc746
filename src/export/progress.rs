//! Progress tracking for export operations
//!
//! Counts processed rows, emits a periodic `debug!` checkpoint and, when
//! enabled, drives a spinner on stderr showing throughput.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Rows between two periodic checkpoints.
pub const CHECKPOINT_ROWS: u64 = 10_000;

/// Maximum time between two periodic checkpoints.
pub const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(2);

/// Progress tracker for one export call
pub struct ProgressTracker {
    /// Format label used in log lines
    label: &'static str,
    /// Rows processed so far
    processed: u64,
    start_time: Instant,
    last_checkpoint: Instant,
    /// Spinner (optional, disabled by default)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `label` - Format name shown in log lines
    /// * `enable_bar` - Whether to display a spinner
    pub fn new(label: &'static str, enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} {pos} rows {msg}")
            {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });

        let now = Instant::now();
        Self {
            label,
            processed: 0,
            start_time: now,
            last_checkpoint: now,
            bar,
        }
    }

    /// Record the total number of rows processed so far.
    ///
    /// # Returns
    /// * `bool` - true when a periodic checkpoint was reached (every
    ///   10,000 rows or 2 seconds); callers flush their writers then
    pub fn update(&mut self, count: u64) -> bool {
        self.processed = count;

        if let Some(ref bar) = self.bar {
            bar.set_position(count);
            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                bar.set_message(format!("({:.0} rows/sec)", count as f64 / elapsed));
            }
        }

        let due = count % CHECKPOINT_ROWS == 0
            || self.last_checkpoint.elapsed() >= CHECKPOINT_INTERVAL;
        if due {
            debug!(
                "{} rows written ({:.0} rows/s, elapsed {:.1}s)",
                count,
                self.rate(),
                self.start_time.elapsed().as_secs_f64()
            );
            self.last_checkpoint = Instant::now();
        }
        due
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    fn rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Clear the spinner and log the final throughput.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        debug!(
            "{} export completed: {} rows in {:.2}s ({:.0} rows/sec)",
            self.label,
            self.processed,
            self.start_time.elapsed().as_secs_f64(),
            self.rate()
        );
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if let Some(ref bar) = self.bar {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
    }
}
