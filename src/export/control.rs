//! Cancellation and runtime configuration.

use super::ExportOrchestrator;
use crate::error::{Error, Result};
use crate::types::{Event, RunId};
use std::time::Duration;

impl ExportOrchestrator {
    /// Request cancellation of the active run
    ///
    /// Cancellation is cooperative: the run stops before the next part begins (or wakes
    /// early from the inter-part delay). A request already in flight is not interrupted,
    /// and parts saved so far stay on disk.
    ///
    /// Returns the ID of the run that was asked to stop.
    ///
    /// # Errors
    ///
    /// [`Error::NotRunning`] if no run is active.
    pub fn cancel(&self) -> Result<RunId> {
        let active = self.run_state.lock_active();
        match active.as_ref() {
            Some(run) => {
                run.cancel_token.cancel();
                tracing::info!(run_id = %run.id, "Export cancellation requested");
                Ok(run.id)
            }
            None => Err(Error::NotRunning),
        }
    }

    /// Whether a run currently holds the single-flight slot
    pub fn is_running(&self) -> bool {
        self.run_state.lock_active().is_some()
    }

    /// ID of the active run, if any
    pub fn active_run(&self) -> Option<RunId> {
        self.run_state.lock_active().as_ref().map(|run| run.id)
    }

    /// Current pause between parts
    pub async fn get_inter_part_delay(&self) -> Duration {
        *self.runtime_config.inter_part_delay.read().await
    }

    /// Change the pause between parts
    ///
    /// Takes effect at the next pause, including for a run already in progress.
    pub async fn set_inter_part_delay(&self, delay: Duration) {
        *self.runtime_config.inter_part_delay.write().await = delay;

        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(delay_ms, "Inter-part delay updated");
        self.emit_event(Event::InterPartDelayChanged { delay_ms });
    }
}
