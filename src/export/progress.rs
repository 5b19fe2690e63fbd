//! Observable progress state.
//!
//! Progress is published through a `tokio::sync::watch` channel: observers always see
//! the latest snapshot and never have to poll the run loop. Only the run loop mutates it.

use crate::error::ExportError;
use crate::types::{DownloadProgress, RunStatus};
use std::sync::Arc;
use tokio::sync::watch;

/// Highest percentage reported while a run is still in progress
///
/// 100 is reserved for a completed run.
pub const MAX_RUNNING_PERCENT: f64 = 99.99;

/// Percentage of `done` out of `total`, rounded to two decimals
pub fn percent_of(done: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(done) / f64::from(total) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Publisher side of the progress state (cloneable, shared by one orchestrator)
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<DownloadProgress>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    /// Create a reporter in the idle state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DownloadProgress::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that always holds the latest progress
    pub fn subscribe(&self) -> watch::Receiver<DownloadProgress> {
        self.tx.subscribe()
    }

    /// Current progress
    pub fn snapshot(&self) -> DownloadProgress {
        self.tx.borrow().clone()
    }

    /// Reset for a new run
    pub(crate) fn begin(&self) {
        self.tx.send_replace(DownloadProgress {
            status: RunStatus::Running,
            current_part: 0,
            total_parts: 0,
            percent: 0.0,
        });
    }

    /// Record the resolved part count
    pub(crate) fn set_total(&self, total_parts: u32) {
        self.tx.send_modify(|p| p.total_parts = total_parts);
    }

    /// A part is about to be fetched
    pub(crate) fn part_started(&self, index: u32) {
        self.tx.send_modify(|p| {
            p.current_part = p.current_part.max(index);
            let before = percent_of(index.saturating_sub(1), p.total_parts);
            p.percent = p.percent.max(before.min(MAX_RUNNING_PERCENT));
        });
    }

    /// A part was saved; returns the new percentage
    pub(crate) fn part_saved(&self, index: u32) -> f64 {
        let mut percent = 0.0;
        self.tx.send_modify(|p| {
            p.current_part = p.current_part.max(index);
            let after = percent_of(index, p.total_parts).min(MAX_RUNNING_PERCENT);
            p.percent = p.percent.max(after);
            percent = p.percent;
        });
        percent
    }

    /// Every part was saved
    pub(crate) fn complete(&self) {
        self.tx.send_modify(|p| {
            p.status = RunStatus::Completed;
            p.current_part = p.total_parts;
            p.percent = 100.0;
        });
    }

    /// The run stopped at a failure; part and percent stay where they were
    pub(crate) fn fail(&self, error: ExportError) {
        self.tx.send_modify(|p| {
            p.status = RunStatus::Failed {
                part: error.part(),
                error,
            };
        });
    }

    /// The run was cancelled between parts
    pub(crate) fn cancel(&self) {
        self.tx.send_modify(|p| p.status = RunStatus::Cancelled);
    }
}
