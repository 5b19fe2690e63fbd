//! Single part retrieval against the batch endpoint.

use super::backend::Endpoints;
use crate::error::ExportError;
use crate::types::{ExportPart, ExportRequest};
use crate::utils::extract_filename_from_response;
use async_trait::async_trait;

/// Fetches one part of an export
#[async_trait]
pub trait PartFetcher: Send + Sync {
    /// Download part `index` (1-based) of `request`
    async fn fetch_part(&self, index: u32, request: &ExportRequest)
    -> Result<ExportPart, ExportError>;
}

/// [`PartFetcher`] backed by the REST batch endpoint
#[derive(Clone, Debug)]
pub struct HttpPartFetcher {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpPartFetcher {
    /// Create a fetcher sharing `client` with the resolver
    pub fn new(client: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }
}

#[async_trait]
impl PartFetcher for HttpPartFetcher {
    async fn fetch_part(
        &self,
        index: u32,
        request: &ExportRequest,
    ) -> Result<ExportPart, ExportError> {
        let url = self.endpoints.part_url(request, index);
        tracing::debug!(url = %url, part = index, "Fetching export part");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExportError::from_reqwest(&e, Some(index)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Http {
                status: status.as_u16(),
                part: Some(index),
            });
        }

        let filename = extract_filename_from_response(&response)
            .unwrap_or_else(|| request.fallback_filename(index));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::from_reqwest(&e, Some(index)))?;

        tracing::debug!(part = index, filename = %filename, size = bytes.len(), "Fetched export part");

        Ok(ExportPart {
            index,
            bytes,
            filename,
        })
    }
}
