//! Export orchestrator split into focused submodules.
//!
//! The `ExportOrchestrator` struct and its methods are organized by concern:
//! - [`backend`] - HTTP client construction and endpoint URLs
//! - [`resolver`] - Part count resolution (info endpoint)
//! - [`fetcher`] - Single part retrieval (batch endpoint)
//! - [`sink`] - Persisting fetched parts to disk
//! - [`progress`] - Observable progress state
//! - [`run`] - The sequential run loop
//! - [`control`] - Cancellation and runtime configuration
//! - [`lifecycle`] - Shutdown coordination

pub mod backend;
mod control;
pub mod fetcher;
mod lifecycle;
pub mod progress;
pub mod resolver;
mod run;
pub mod sink;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use backend::Endpoints;
pub use fetcher::{HttpPartFetcher, PartFetcher};
pub use progress::ProgressReporter;
pub use resolver::{HttpInfoResolver, InfoResolver};
pub use sink::{DownloadSink, FileSink, StagingStats};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Event, RunId, RunOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The pluggable steps of a run
#[derive(Clone)]
pub(crate) struct Components {
    /// Resolves how many parts an export has
    pub(crate) resolver: Arc<dyn InfoResolver>,
    /// Fetches one part
    pub(crate) fetcher: Arc<dyn PartFetcher>,
    /// Persists one fetched part
    pub(crate) sink: Arc<dyn DownloadSink>,
}

/// The run currently holding the single-flight slot
#[derive(Debug)]
pub(crate) struct ActiveRun {
    pub(crate) id: RunId,
    pub(crate) cancel_token: CancellationToken,
}

/// Single-flight guard and run bookkeeping
#[derive(Clone)]
pub(crate) struct RunState {
    /// At most one active run; `Some` means a run holds the slot
    pub(crate) active: Arc<std::sync::Mutex<Option<ActiveRun>>>,
    /// Set to false during shutdown
    pub(crate) accepting_new: Arc<std::sync::atomic::AtomicBool>,
    /// Next run ID to hand out
    pub(crate) next_run_id: Arc<std::sync::atomic::AtomicU64>,
    /// Terminal outcome of the most recent run
    pub(crate) last_outcome: Arc<tokio::sync::RwLock<Option<RunOutcome>>>,
}

impl RunState {
    fn new() -> Self {
        Self {
            active: Arc::new(std::sync::Mutex::new(None)),
            accepting_new: Arc::new(std::sync::atomic::AtomicBool::new(true)),
            next_run_id: Arc::new(std::sync::atomic::AtomicU64::new(1)),
            last_outcome: Arc::new(tokio::sync::RwLock::new(None)),
        }
    }

    /// Lock the active-run slot, recovering from a poisoned lock
    pub(crate) fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveRun>> {
        self.active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Runtime-mutable configuration (separate from static config)
#[derive(Clone)]
pub(crate) struct RuntimeConfig {
    /// Pause between parts; read at every iteration
    pub(crate) inter_part_delay: Arc<tokio::sync::RwLock<Duration>>,
}

/// Sequential export orchestrator (cloneable - all fields are Arc-wrapped)
///
/// One instance is shared by every screen that exports data. Screens observe
/// [`progress`](Self::watch_progress) and [`events`](Self::subscribe) instead of keeping
/// their own copies of the download state.
#[derive(Clone)]
pub struct ExportOrchestrator {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Resolver, fetcher and sink
    pub(crate) components: Components,
    /// Observable progress, written only by the run loop
    pub(crate) progress: ProgressReporter,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Single-flight guard and run bookkeeping
    pub(crate) run_state: RunState,
    /// Runtime-mutable configuration
    pub(crate) runtime_config: RuntimeConfig,
}

impl ExportOrchestrator {
    /// Create an orchestrator talking HTTP to the configured backend
    ///
    /// This validates the configuration, creates the download directory and builds the
    /// shared HTTP client used by the info resolver and the part fetcher.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.export.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.export.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let client = backend::build_http_client(&config.backend)?;
        let endpoints = Endpoints::new(&config.backend.base_url)?;

        let resolver = Arc::new(HttpInfoResolver::new(
            client.clone(),
            endpoints.clone(),
            config.backend.count_fields.clone(),
        ));
        let fetcher = Arc::new(HttpPartFetcher::new(client, endpoints));
        let sink = Arc::new(FileSink::from_config(&config.export));

        tracing::info!(
            base_url = %config.backend.base_url,
            download_dir = %config.export.download_dir.display(),
            request_timeout_secs = config.backend.request_timeout.as_secs(),
            "Export orchestrator initialized"
        );

        Ok(Self::with_components(config, resolver, fetcher, sink))
    }

    /// Create an orchestrator from explicit components
    ///
    /// Used to plug in alternative resolvers, fetchers or sinks (and by tests).
    pub fn with_components(
        config: Config,
        resolver: Arc<dyn InfoResolver>,
        fetcher: Arc<dyn PartFetcher>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        // Buffer of 1000 events lets slow subscribers catch up before lagging
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let runtime_config = RuntimeConfig {
            inter_part_delay: Arc::new(tokio::sync::RwLock::new(config.export.inter_part_delay)),
        };

        Self {
            config: Arc::new(config),
            components: Components {
                resolver,
                fetcher,
                sink,
            },
            progress: ProgressReporter::new(),
            event_tx,
            run_state: RunState::new(),
            runtime_config,
        }
    }

    /// Subscribe to orchestrator events
    ///
    /// Each subscriber receives all events independently. A subscriber that falls more
    /// than 1000 events behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Watch the progress state; the receiver always holds the latest value
    pub fn watch_progress(&self) -> tokio::sync::watch::Receiver<crate::types::DownloadProgress> {
        self.progress.subscribe()
    }

    /// Snapshot of the current progress
    pub fn progress(&self) -> crate::types::DownloadProgress {
        self.progress.snapshot()
    }

    /// Terminal outcome of the most recent run, if any run has finished
    pub async fn last_outcome(&self) -> Option<RunOutcome> {
        self.run_state.last_outcome.read().await.clone()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// With no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let orchestrator = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(orchestrator, config).await })
    }
}
