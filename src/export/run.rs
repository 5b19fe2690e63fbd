//! The sequential run loop.

use super::{ActiveRun, ExportOrchestrator};
use crate::error::{Error, ExportError, Result};
use crate::types::{Event, ExportRequest, RunId, RunOutcome, TerminalStatus};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

/// Holds the single-flight slot for one run and frees it on drop
///
/// A guard dropped before its run published a terminal state (the `run` future was
/// dropped mid-flight) records the run as cancelled, so progress never stays
/// `Running` without an active run.
pub(crate) struct RunGuard {
    orchestrator: ExportOrchestrator,
    pub(crate) run_id: RunId,
    pub(crate) cancel_token: CancellationToken,
    /// Highest part index saved so far
    saved_parts: AtomicU32,
    /// Terminal state has been published
    settled: bool,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.orchestrator
                .settle_abandoned(self.run_id, self.saved_parts.load(Ordering::SeqCst));
        }

        let mut active = self.orchestrator.run_state.lock_active();
        if active.as_ref().is_some_and(|run| run.id == self.run_id) {
            *active = None;
        }
    }
}

impl ExportOrchestrator {
    /// Run an export to completion
    ///
    /// Resolves the part count, then fetches and saves every part in order, pausing
    /// between parts. The first failure ends the run; parts saved before it stay on disk.
    /// Failures inside the run are reported through the returned [`TerminalStatus`],
    /// not as `Err`. Dropping the future before it resolves stops the run, which is
    /// then recorded as cancelled.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if another run is in progress (nothing changes)
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown) began
    pub async fn run(&self, request: ExportRequest) -> Result<TerminalStatus> {
        let guard = self.begin_run()?;
        Ok(self.drive(guard, request).await)
    }

    /// Start an export in a background task and return its run ID
    ///
    /// The single-flight slot is taken before this returns, so a second `start` or
    /// `run` issued right after is rejected. The outcome is available through
    /// [`last_outcome`](Self::last_outcome) and the event stream.
    pub fn start(&self, request: ExportRequest) -> Result<RunId> {
        let guard = self.begin_run()?;
        let run_id = guard.run_id;
        let orchestrator = self.clone();

        tokio::spawn(async move {
            orchestrator.drive(guard, request).await;
        });

        Ok(run_id)
    }

    /// Take the single-flight slot
    fn begin_run(&self) -> Result<RunGuard> {
        if !self.run_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let mut active = self.run_state.lock_active();
        if let Some(run) = active.as_ref() {
            tracing::debug!(active_run = %run.id, "Rejecting export: another run is in progress");
            return Err(Error::AlreadyRunning);
        }

        let run_id = RunId(self.run_state.next_run_id.fetch_add(1, Ordering::SeqCst));
        let cancel_token = CancellationToken::new();
        *active = Some(ActiveRun {
            id: run_id,
            cancel_token: cancel_token.clone(),
        });
        // Observers see the new run as soon as the slot is taken
        self.progress.begin();
        drop(active);

        Ok(RunGuard {
            orchestrator: self.clone(),
            run_id,
            cancel_token,
            saved_parts: AtomicU32::new(0),
            settled: false,
        })
    }

    /// Execute a run that holds `guard` and publish its outcome
    async fn drive(&self, mut guard: RunGuard, request: ExportRequest) -> TerminalStatus {
        let run_id = guard.run_id;

        self.emit_event(Event::RunStarted {
            run_id,
            request: request.clone(),
        });
        tracing::info!(
            run_id = %run_id,
            kind = %request.kind,
            format = request.format.as_segment(),
            filters = request.filters.len(),
            "Export started"
        );

        let status = self.execute(&guard, &request).await;
        let message = status.message();

        *self.run_state.last_outcome.write().await = Some(RunOutcome {
            run_id,
            status: status.clone(),
            message: message.clone(),
            finished_at: chrono::Utc::now(),
        });

        // No await points from here on: progress, event and slot release happen together
        match &status {
            TerminalStatus::Completed { total_parts } => {
                self.progress.complete();
                tracing::info!(run_id = %run_id, total_parts, "Export completed");
                self.emit_event(Event::RunCompleted {
                    run_id,
                    total_parts: *total_parts,
                });
            }
            TerminalStatus::Failed { error, .. } => {
                self.progress.fail(error.clone());
                tracing::warn!(
                    run_id = %run_id,
                    part = ?error.part(),
                    error = %error,
                    "Export failed"
                );
                self.emit_event(Event::RunFailed {
                    run_id,
                    error: error.clone(),
                    message,
                });
            }
            TerminalStatus::Cancelled {
                saved_parts,
                total_parts,
            } => {
                self.progress.cancel();
                tracing::info!(run_id = %run_id, saved_parts, total_parts, "Export cancelled");
                self.emit_event(Event::RunCancelled {
                    run_id,
                    saved_parts: *saved_parts,
                });
            }
        }

        guard.settled = true;
        drop(guard);
        status
    }

    /// Record a run whose future was dropped before it finished as cancelled
    fn settle_abandoned(&self, run_id: RunId, saved_parts: u32) {
        let total_parts = self.progress.snapshot().total_parts;
        let status = TerminalStatus::Cancelled {
            saved_parts,
            total_parts,
        };
        tracing::warn!(
            run_id = %run_id,
            saved_parts,
            total_parts,
            "Export dropped before finishing, recording it as cancelled"
        );

        match self.run_state.last_outcome.try_write() {
            Ok(mut last_outcome) => {
                *last_outcome = Some(RunOutcome {
                    run_id,
                    message: status.message(),
                    status,
                    finished_at: chrono::Utc::now(),
                });
            }
            Err(_) => {
                tracing::warn!(run_id = %run_id, "Outcome slot busy, abandoned run not recorded");
            }
        }

        self.progress.cancel();
        self.emit_event(Event::RunCancelled {
            run_id,
            saved_parts,
        });
    }

    /// Info phase followed by the part loop
    async fn execute(&self, guard: &RunGuard, request: &ExportRequest) -> TerminalStatus {
        let run_id = guard.run_id;
        let cancel_token = &guard.cancel_token;

        let info = match self.components.resolver.get_info(request).await {
            Ok(info) => info,
            Err(error) => {
                return TerminalStatus::Failed {
                    total_parts: None,
                    error,
                };
            }
        };

        let total_parts = info.total_parts;
        self.progress.set_total(total_parts);
        self.emit_event(Event::InfoResolved {
            run_id,
            total_parts,
        });
        tracing::debug!(run_id = %run_id, total_parts, "Export info resolved");

        let mut saved_parts = 0;
        for index in 1..=total_parts {
            if cancel_token.is_cancelled() {
                return TerminalStatus::Cancelled {
                    saved_parts,
                    total_parts,
                };
            }

            self.progress.part_started(index);
            self.emit_event(Event::PartStarted {
                run_id,
                index,
                total_parts,
            });

            if let Err(error) = self.process_part(run_id, index, total_parts, request).await {
                return TerminalStatus::Failed {
                    total_parts: Some(total_parts),
                    error,
                };
            }
            saved_parts = index;
            guard.saved_parts.store(index, Ordering::SeqCst);

            if index < total_parts {
                self.pause_between_parts(cancel_token).await;
            }
        }

        TerminalStatus::Completed { total_parts }
    }

    /// Fetch and save one part
    async fn process_part(
        &self,
        run_id: RunId,
        index: u32,
        total_parts: u32,
        request: &ExportRequest,
    ) -> std::result::Result<(), ExportError> {
        let part = self
            .components
            .fetcher
            .fetch_part(index, request)
            .await
            .map_err(|e| e.at_part(index))?;

        let saved = self
            .components
            .sink
            .save(part)
            .await
            .map_err(|e| e.at_part(index))?;

        let percent = self.progress.part_saved(index);
        tracing::info!(
            run_id = %run_id,
            part = index,
            total_parts,
            percent,
            path = %saved.path.display(),
            "Export part saved"
        );
        self.emit_event(Event::PartSaved {
            run_id,
            part: saved,
            total_parts,
            percent,
        });

        Ok(())
    }

    /// Wait the inter-part delay; a cancellation ends the wait early
    async fn pause_between_parts(&self, cancel_token: &CancellationToken) {
        let delay = *self.runtime_config.inter_part_delay.read().await;
        if delay.is_zero() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel_token.cancelled() => {
                tracing::debug!("Inter-part delay interrupted by cancellation");
            }
        }
    }
}
