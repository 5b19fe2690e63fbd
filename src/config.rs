//! Configuration types for export-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Export backend connection settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BackendConfig {
    /// Base URL of the REST backend (default: "http://localhost:8000")
    ///
    /// Export endpoints are resolved below this URL, e.g.
    /// `{base_url}/download/excel/voters/info`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout covering connect, headers and body (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,

    /// TCP connect timeout (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub connect_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Info response fields holding the part count, tried in order
    ///
    /// Different export endpoints name this field differently; the first one present wins.
    #[serde(default = "default_count_fields")]
    pub count_fields: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            count_fields: default_count_fields(),
        }
    }
}

/// Export behavior (where parts go, pacing between parts)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportConfig {
    /// Directory parts are saved into (default: "./exports")
    #[serde(default = "default_download_dir")]
    #[schema(value_type = String)]
    pub download_dir: PathBuf,

    /// Pause after each saved part before fetching the next one (default: 1200 ms)
    #[serde(default = "default_inter_part_delay", with = "duration_ms_serde")]
    #[schema(value_type = u64)]
    pub inter_part_delay: Duration,

    /// Grace period before a part's staging file is released (default: 100 ms)
    #[serde(default = "default_sink_grace_period", with = "duration_ms_serde")]
    #[schema(value_type = u64)]
    pub sink_grace_period: Duration,

    /// What to do when a part's target file already exists
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            inter_part_delay: default_inter_part_delay(),
            sink_grace_period: default_sink_grace_period(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Fail the part, keep existing
    Skip,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind the API server (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for [`ExportOrchestrator`](crate::ExportOrchestrator)
///
/// Fields are organized into sub-configs:
/// - [`backend`](BackendConfig) - base URL, timeouts, info field names
/// - [`export`](ExportConfig) - download directory, pacing, collisions
/// - [`server`](ServerIntegrationConfig) - REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Export backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Export behavior
    #[serde(default)]
    pub export: ExportConfig,

    /// API server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.export.download_dir
    }

    /// Check that the configuration is usable
    ///
    /// Rejects a base URL that is not an absolute http(s) URL usable as a base,
    /// and an empty list of count fields.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.backend.base_url, e),
            key: Some("backend.base_url".to_string()),
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!(
                    "base URL '{}' must be an http or https URL",
                    self.backend.base_url
                ),
                key: Some("backend.base_url".to_string()),
            });
        }

        if self.backend.count_fields.iter().all(|f| f.trim().is_empty()) {
            return Err(Error::Config {
                message: "at least one part count field name is required".to_string(),
                key: Some("backend.count_fields".to_string()),
            });
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("export-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_count_fields() -> Vec<String> {
    vec![
        "num_parts".to_string(),
        "num_batches".to_string(),
        "total_parts".to_string(),
    ]
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_inter_part_delay() -> Duration {
    Duration::from_millis(1200)
}

fn default_sink_grace_period() -> Duration {
    Duration::from_millis(100)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
