//! # export-dl
//!
//! Sequential, multi-part export downloads from a REST backend.
//!
//! Large exports (voter registries, raffle tickets, collector referrals) are split
//! server-side into numbered parts. An [`ExportOrchestrator`] asks the backend how many
//! parts an export has, then fetches and saves them one after another, pausing between
//! parts, while publishing a single progress state every screen can observe.
//!
//! ## Behavior
//!
//! - **One run at a time** - a second run is rejected, never queued or interleaved
//! - **Fail fast** - the first failing part ends the run; earlier parts stay on disk
//! - **Cooperative cancellation** - a run stops between parts, never mid-request
//! - **Event-driven** - consumers subscribe to events and watch progress, no polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use export_dl::{Config, ExportOrchestrator, ExportRequest, ExportKind, ExportFormat};
//! use export_dl::types::filter_keys;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.backend.base_url = "http://localhost:8000".to_string();
//!
//!     let orchestrator = ExportOrchestrator::new(config).await?;
//!
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = ExportRequest::new(ExportKind::Voters, ExportFormat::Spreadsheet)
//!         .with_filter(filter_keys::CODIGO_ESTADO, "05");
//!     let status = orchestrator.run(request).await?;
//!     println!("{}", status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export orchestration (decomposed into focused submodules)
pub mod export;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, FileCollisionAction};
pub use error::{ApiError, ErrorDetail, Error, ExportError, Result, ToHttpStatus};
pub use export::{
    DownloadSink, ExportOrchestrator, FileSink, HttpInfoResolver, HttpPartFetcher, InfoResolver,
    PartFetcher,
};
pub use types::{
    DownloadProgress, Event, ExportFormat, ExportInfo, ExportKind, ExportPart, ExportRequest,
    RunId, RunOutcome, RunStatus, SavedPart, TerminalStatus,
};

/// Run the orchestrator until a termination signal, then shut it down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, falling back to Ctrl+C if registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use export_dl::{Config, ExportOrchestrator, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = Arc::new(ExportOrchestrator::new(Config::default()).await?);
///     orchestrator.spawn_api_server();
///
///     run_with_shutdown(&orchestrator).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(orchestrator: &ExportOrchestrator) -> Result<()> {
    wait_for_signal().await;
    orchestrator.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
