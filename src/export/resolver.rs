//! Part count resolution against the info endpoint.

use super::backend::Endpoints;
use crate::error::ExportError;
use crate::types::{ExportInfo, ExportRequest};
use async_trait::async_trait;
use serde_json::Value;

/// Fields checked, in order, when no count field is present
///
/// A zero in any of them means "nothing to export".
const RECORD_COUNT_FIELDS: [&str; 2] = ["total_records", "total"];

/// Resolves how many parts an export has
#[async_trait]
pub trait InfoResolver: Send + Sync {
    /// Ask the backend how many parts `request` is split into
    async fn get_info(&self, request: &ExportRequest) -> Result<ExportInfo, ExportError>;
}

/// [`InfoResolver`] backed by the REST info endpoint
#[derive(Clone, Debug)]
pub struct HttpInfoResolver {
    client: reqwest::Client,
    endpoints: Endpoints,
    count_fields: Vec<String>,
}

impl HttpInfoResolver {
    /// Create a resolver; `count_fields` are tried in order
    pub fn new(client: reqwest::Client, endpoints: Endpoints, count_fields: Vec<String>) -> Self {
        Self {
            client,
            endpoints,
            count_fields,
        }
    }
}

#[async_trait]
impl InfoResolver for HttpInfoResolver {
    async fn get_info(&self, request: &ExportRequest) -> Result<ExportInfo, ExportError> {
        let url = self.endpoints.info_url(request);
        tracing::debug!(url = %url, kind = %request.kind, "Resolving export info");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExportError::from_reqwest(&e, None))?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(ExportInfo { total_parts: 0 });
        }
        if !status.is_success() {
            return Err(ExportError::Http {
                status: status.as_u16(),
                part: None,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ExportError::from_reqwest(&e, None))?;

        let value: Value = serde_json::from_slice(&body).map_err(|e| ExportError::Format {
            message: format!("info response is not valid JSON: {}", e),
        })?;

        let total_parts = parse_part_count(&value, &self.count_fields)?;
        Ok(ExportInfo { total_parts })
    }
}

/// Extract the part count from an info response body
///
/// The first of `count_fields` present in the object wins. Its value may be a
/// non-negative integer or a string holding one. Without any count field, a zero
/// record count means zero parts; anything else is a format error.
pub fn parse_part_count(value: &Value, count_fields: &[String]) -> Result<u32, ExportError> {
    let Some(object) = value.as_object() else {
        return Err(ExportError::Format {
            message: "info response is not a JSON object".to_string(),
        });
    };

    for field in count_fields {
        if let Some(raw) = object.get(field.as_str()) {
            if raw.is_null() {
                continue;
            }
            return count_from_value(raw).ok_or_else(|| ExportError::Format {
                message: format!("field '{}' is not a part count: {}", field, raw),
            });
        }
    }

    let no_records = RECORD_COUNT_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .any(|raw| count_from_value(raw) == Some(0));
    if no_records {
        return Ok(0);
    }

    Err(ExportError::Format {
        message: format!("missing part count (expected one of: {})", count_fields.join(", ")),
    })
}

fn count_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return u32::try_from(count).ok();
            }
            let float = n.as_f64()?;
            if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= f64::from(u32::MAX)
            {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                return Some(float as u32);
            }
            None
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}
