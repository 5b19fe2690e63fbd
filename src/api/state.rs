//! Application state for the API server

use crate::{Config, ExportOrchestrator};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The shared export orchestrator
    pub orchestrator: Arc<ExportOrchestrator>,

    /// Configuration (read-only; runtime updates go through the orchestrator)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Arc<ExportOrchestrator>, config: Arc<Config>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }
}
