//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the export-dl REST API using utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the export-dl REST API
///
/// The document can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "export-dl REST API",
        version = "0.1.0",
        description = "Start, cancel and observe sequential multi-part export downloads",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Exports
        crate::api::routes::start_export,
        crate::api::routes::get_progress,
        crate::api::routes::get_result,
        crate::api::routes::cancel_export,

        // Configuration
        crate::api::routes::get_config,
        crate::api::routes::get_inter_part_delay,
        crate::api::routes::set_inter_part_delay,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::RunId,
        crate::types::ExportFormat,
        crate::types::ExportRequest,
        crate::types::ExportInfo,
        crate::types::SavedPart,
        crate::types::RunStatus,
        crate::types::DownloadProgress,
        crate::types::TerminalStatus,
        crate::types::RunOutcome,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::BackendConfig,
        crate::config::ExportConfig,
        crate::config::FileCollisionAction,
        crate::config::ApiConfig,
        crate::config::ServerIntegrationConfig,

        // API request/response types from routes
        crate::api::routes::StartExportResponse,
        crate::api::routes::InterPartDelay,

        // Error types from error.rs
        crate::error::ExportError,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "exports", description = "Export runs - Start, cancel and observe the single active export"),
        (name = "config", description = "Configuration - Read configuration and adjust pacing at runtime"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
