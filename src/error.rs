//! Error types for export-dl
//!
//! This module provides error handling for the library, including:
//! - The export failure taxonomy (network, HTTP, format, sink) carried by terminal statuses
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for export-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for export-dl
///
/// Failures that happen *inside* a run are not returned through this type; they end
/// the run and are reported as a [`TerminalStatus::Failed`](crate::types::TerminalStatus).
/// This type covers everything around a run: configuration, single-flight rejection,
/// shutdown, I/O and the API server.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "backend.base_url")
        key: Option<String>,
    },

    /// Export step failed (info resolution, part fetch or save)
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Another run is already in progress on this orchestrator
    #[error("an export is already running")]
    AlreadyRunning,

    /// No run is in progress
    #[error("no export is running")]
    NotRunning,

    /// Shutdown in progress - not accepting new runs
    #[error("shutdown in progress: not accepting new exports")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure of a single export step
///
/// Every variant aborts the run it occurs in. The failing part index is carried
/// when the failure belongs to a part (`None` means the info phase failed).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportError {
    /// Transport-level failure (connection refused, timeout, offline, truncated body)
    #[error("network error{}: {message}", fmt_part(.part))]
    Network {
        /// Part being fetched, or `None` for the info request
        part: Option<u32>,
        /// Description of the transport failure
        message: String,
    },

    /// Non-2xx response from the info or part endpoint
    #[error("HTTP {status}{}", fmt_part(.part))]
    Http {
        /// HTTP status code returned by the backend
        status: u16,
        /// Part being fetched, or `None` for the info request
        part: Option<u32>,
    },

    /// Info response did not contain a usable part count
    #[error("unexpected info response: {message}")]
    Format {
        /// What was wrong with the response
        message: String,
    },

    /// Persisting a fetched part to disk failed
    #[error("failed to save part {part}: {message}")]
    Sink {
        /// Part that could not be saved
        part: u32,
        /// Target path, if one had been resolved
        path: Option<PathBuf>,
        /// Description of the local failure
        message: String,
    },
}

fn fmt_part(part: &Option<u32>) -> String {
    match part {
        Some(index) => format!(" on part {index}"),
        None => String::new(),
    }
}

impl ExportError {
    /// Part index the failure belongs to, if any
    pub fn part(&self) -> Option<u32> {
        match self {
            ExportError::Network { part, .. } | ExportError::Http { part, .. } => *part,
            ExportError::Format { .. } => None,
            ExportError::Sink { part, .. } => Some(*part),
        }
    }

    /// Machine-readable code for this failure
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::Network { .. } => "network_error",
            ExportError::Http { .. } => "http_error",
            ExportError::Format { .. } => "format_error",
            ExportError::Sink { .. } => "sink_error",
        }
    }

    /// Build a network error from a reqwest failure
    pub(crate) fn from_reqwest(error: &reqwest::Error, part: Option<u32>) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        ExportError::Network { part, message }
    }

    /// Attach a part index to a transport or HTTP failure that lacks one
    pub(crate) fn at_part(self, index: u32) -> Self {
        match self {
            ExportError::Network {
                part: None,
                message,
            } => ExportError::Network {
                part: Some(index),
                message,
            },
            ExportError::Http { status, part: None } => ExportError::Http {
                status,
                part: Some(index),
            },
            other => other,
        }
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "already_running",
///     "message": "an export is already running"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            // 409 Conflict - single-flight guard
            Error::AlreadyRunning => 409,
            Error::NotRunning => 409,

            // 502 Bad Gateway - the export backend misbehaved
            Error::Export(ExportError::Network { .. }) => 502,
            Error::Export(ExportError::Http { .. }) => 502,
            Error::Export(ExportError::Format { .. }) => 502,

            Error::Export(ExportError::Sink { .. }) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Export(e) => e.code(),
            Error::AlreadyRunning => "already_running",
            Error::NotRunning => "not_running",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Export(ExportError::Http { status, part }) => Some(serde_json::json!({
                "status": status,
                "part": part,
            })),
            Error::Export(ExportError::Network { part: Some(part), .. }) => {
                Some(serde_json::json!({ "part": part }))
            }
            Error::Export(ExportError::Sink { part, path, .. }) => Some(serde_json::json!({
                "part": part,
                "path": path,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
