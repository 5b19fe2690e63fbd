//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`exports`] - Start, cancel and observe export runs
//! - [`config`] - Configuration and runtime pacing
//! - [`system`] - Health, events, OpenAPI

use crate::types::RunId;
use serde::{Deserialize, Serialize};

mod config;
mod exports;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use config::*;
pub use exports::*;
pub use system::*;

/// Response for POST /exports
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartExportResponse {
    /// ID of the run that was started
    pub run_id: RunId,
}

/// Body of GET and PUT /config/inter-part-delay
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct InterPartDelay {
    /// Pause between parts, in milliseconds
    pub delay_ms: u64,
}
