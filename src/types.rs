//! Core types for export-dl

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::error::ExportError;

/// Well-known filter keys understood by the export backend
pub mod filter_keys {
    /// Geographic state code
    pub const CODIGO_ESTADO: &str = "codigo_estado";
    /// Municipality code (within a state)
    pub const CODIGO_MUNICIPIO: &str = "codigo_municipio";
    /// Parish code (within a municipality)
    pub const CODIGO_PARROQUIA: &str = "codigo_parroquia";
    /// Voting center code
    pub const CODIGO_CENTRO_VOTACION: &str = "codigo_centro_votacion";
    /// Free-text search term
    pub const SEARCH: &str = "search";
    /// Collector (referral owner) id
    pub const RECOLECTOR_ID: &str = "recolector_id";
}

/// Unique identifier for one orchestrator run
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl RunId {
    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dataset being exported
///
/// Serialized as its path segment (`"voters"`, `"tickets"`, `"referrals"`); any other
/// string is carried through as a custom kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExportKind {
    /// Voter registry
    Voters,
    /// Raffle tickets
    Tickets,
    /// Tickets referred by a collector
    CollectorReferrals,
    /// Any other export family exposed by the backend
    Custom(String),
}

impl ExportKind {
    /// Path segment used in export endpoints and fallback filenames
    pub fn as_segment(&self) -> &str {
        match self {
            ExportKind::Voters => "voters",
            ExportKind::Tickets => "tickets",
            ExportKind::CollectorReferrals => "referrals",
            ExportKind::Custom(name) => name,
        }
    }
}

impl From<String> for ExportKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "voters" => ExportKind::Voters,
            "tickets" => ExportKind::Tickets,
            "referrals" => ExportKind::CollectorReferrals,
            _ => ExportKind::Custom(value),
        }
    }
}

impl From<ExportKind> for String {
    fn from(kind: ExportKind) -> Self {
        kind.as_segment().to_string()
    }
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_segment())
    }
}

/// Output format of the exported parts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Spreadsheet workbook (`.xlsx`)
    #[default]
    Spreadsheet,
    /// Plain text (`.txt`)
    Text,
}

impl ExportFormat {
    /// Path segment used in export endpoints
    pub fn as_segment(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "excel",
            ExportFormat::Text => "txt",
        }
    }

    /// File extension for saved parts
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Text => "txt",
        }
    }
}

/// Insertion-ordered filter context (filter name → value)
pub type Filters = IndexMap<String, String>;

/// What to export: kind, format and the filter context narrowing the records
///
/// A request is immutable once handed to a run; the orchestrator only borrows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportRequest {
    /// Dataset to export
    #[schema(value_type = String, example = "voters")]
    pub kind: ExportKind,
    /// Output format
    #[serde(default)]
    pub format: ExportFormat,
    /// Filter context, passed to the backend as query parameters in this order
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: Filters,
}

impl ExportRequest {
    /// Create a request with an empty filter context
    pub fn new(kind: ExportKind, format: ExportFormat) -> Self {
        Self {
            kind,
            format,
            filters: Filters::new(),
        }
    }

    /// Add (or replace) a filter, keeping its original position when replaced
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Filters that are actually sent; empty values mean "not selected" and are skipped
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .map(|(k, v)| (k.as_str(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
    }

    /// Deterministic filename used when the backend does not suggest one
    pub fn fallback_filename(&self, index: u32) -> String {
        format!(
            "{}_part_{}.{}",
            self.kind.as_segment(),
            index,
            self.format.extension()
        )
    }
}

/// Result of the info phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportInfo {
    /// Number of parts the backend split the export into (0 = nothing to export)
    pub total_parts: u32,
}

/// One fetched part, moved into the sink and dropped after saving
#[derive(Debug)]
pub struct ExportPart {
    /// 1-based part index
    pub index: u32,
    /// Payload as returned by the backend
    pub bytes: bytes::Bytes,
    /// Suggested filename (already sanitized)
    pub filename: String,
}

/// Where a part ended up on disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SavedPart {
    /// 1-based part index
    pub index: u32,
    /// Final path of the saved file
    pub path: PathBuf,
    /// Number of bytes written
    pub bytes: u64,
}

/// Run state as a tagged union
///
/// Failure details live inside the `Failed` variant so no combination of flags can
/// describe an impossible state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    /// No run has started yet
    #[default]
    Idle,
    /// A run is in progress
    Running,
    /// Every part was saved
    Completed,
    /// The run stopped at a failure
    Failed {
        /// Failing part index (`None` when the info phase failed)
        part: Option<u32>,
        /// The failure
        error: ExportError,
    },
    /// The run was cancelled between parts
    Cancelled,
}

impl RunStatus {
    /// Whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed { .. } | RunStatus::Cancelled
        )
    }
}

/// Observable progress of the orchestrator
///
/// One instance per orchestrator; reset when a run starts and left at its terminal
/// value until the next run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DownloadProgress {
    /// Run state
    pub status: RunStatus,
    /// Part currently being processed (0 before the first part)
    pub current_part: u32,
    /// Total parts of the current run (0 until resolved)
    pub total_parts: u32,
    /// Completion percentage (0.0 to 100.0); exactly 100.0 only when completed
    pub percent: f64,
}

/// Final status of one run, returned to the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerminalStatus {
    /// All parts saved
    Completed {
        /// Number of parts saved
        total_parts: u32,
    },
    /// Run aborted by a failure; parts before the failing one are on disk
    Failed {
        /// Parts known at failure time (`None` when the info phase failed)
        total_parts: Option<u32>,
        /// The failure, including the failing part index
        error: ExportError,
    },
    /// Run stopped by cancellation; saved parts are kept
    Cancelled {
        /// Parts saved before cancellation
        saved_parts: u32,
        /// Parts known at cancellation time
        total_parts: u32,
    },
}

impl TerminalStatus {
    /// Failing part index, if the run failed on a part
    pub fn failed_part(&self) -> Option<u32> {
        match self {
            TerminalStatus::Failed { error, .. } => error.part(),
            _ => None,
        }
    }

    /// Single human-readable message for the user
    pub fn message(&self) -> String {
        match self {
            TerminalStatus::Completed { total_parts: 0 } => {
                "Export completed: nothing to export".to_string()
            }
            TerminalStatus::Completed { total_parts } => {
                format!("Export completed: {total_parts} part(s) saved")
            }
            TerminalStatus::Failed {
                total_parts: Some(total),
                error,
            } if error.part().is_some() => {
                format!(
                    "Export failed at part {} of {}: {}",
                    error.part().unwrap_or_default(),
                    total,
                    error
                )
            }
            TerminalStatus::Failed { error, .. } => {
                format!("Export failed before any part was fetched: {error}")
            }
            TerminalStatus::Cancelled {
                saved_parts,
                total_parts,
            } => format!("Export cancelled after {saved_parts} of {total_parts} part(s)"),
        }
    }
}

impl std::fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Terminal outcome of the most recent run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunOutcome {
    /// Run the outcome belongs to
    pub run_id: RunId,
    /// Terminal status
    pub status: TerminalStatus,
    /// Human-readable message
    pub message: String,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

/// Event emitted by the orchestrator
///
/// Consumers subscribe via [`ExportOrchestrator::subscribe`](crate::ExportOrchestrator::subscribe).
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run started
    RunStarted {
        /// Run ID
        run_id: RunId,
        /// Request being exported
        request: ExportRequest,
    },

    /// Part count resolved
    InfoResolved {
        /// Run ID
        run_id: RunId,
        /// Number of parts
        total_parts: u32,
    },

    /// A part fetch is about to start
    PartStarted {
        /// Run ID
        run_id: RunId,
        /// 1-based part index
        index: u32,
        /// Number of parts
        total_parts: u32,
    },

    /// A part was saved to disk
    PartSaved {
        /// Run ID
        run_id: RunId,
        /// Where the part was saved
        part: SavedPart,
        /// Number of parts
        total_parts: u32,
        /// Progress percentage after this part
        percent: f64,
    },

    /// Run finished with every part saved
    RunCompleted {
        /// Run ID
        run_id: RunId,
        /// Number of parts saved
        total_parts: u32,
    },

    /// Run aborted by a failure
    RunFailed {
        /// Run ID
        run_id: RunId,
        /// The failure
        error: ExportError,
        /// Human-readable message
        message: String,
    },

    /// Run stopped by cancellation
    RunCancelled {
        /// Run ID
        run_id: RunId,
        /// Parts saved before cancellation
        saved_parts: u32,
    },

    /// Inter-part delay changed at runtime
    InterPartDelayChanged {
        /// New delay in milliseconds
        delay_ms: u64,
    },

    /// Orchestrator shut down
    Shutdown,
}

impl Event {
    /// Short name used as the SSE event type
    pub fn name(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run_started",
            Event::InfoResolved { .. } => "info_resolved",
            Event::PartStarted { .. } => "part_started",
            Event::PartSaved { .. } => "part_saved",
            Event::RunCompleted { .. } => "run_completed",
            Event::RunFailed { .. } => "run_failed",
            Event::RunCancelled { .. } => "run_cancelled",
            Event::InterPartDelayChanged { .. } => "inter_part_delay_changed",
            Event::Shutdown => "shutdown",
        }
    }
}
