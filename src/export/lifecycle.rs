//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::time::Duration;

use super::ExportOrchestrator;

/// Upper bound on how long shutdown waits for the active run
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl ExportOrchestrator {
    /// Gracefully shut down the orchestrator
    ///
    /// The shutdown sequence:
    /// 1. Stops accepting new runs (`run`/`start` return [`ShuttingDown`](crate::Error::ShuttingDown))
    /// 2. Cancels the active run, which stops before its next part
    /// 3. Waits up to 30 seconds for that run to finish its in-flight part
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Parts already saved stay on disk. Calling this twice is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.run_state
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new exports");

        if let Ok(run_id) = self.cancel() {
            tracing::info!(run_id = %run_id, "Signaled cancellation to the active export");
        }

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_run()).await {
            Ok(()) => tracing::info!("No export running"),
            Err(_) => {
                tracing::warn!("Timeout waiting for the active export, proceeding with shutdown")
            }
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Wait until no run holds the single-flight slot
    async fn wait_for_active_run(&self) {
        while self.is_running() {
            tracing::debug!("Waiting for the active export to stop");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
