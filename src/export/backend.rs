//! HTTP client construction and export endpoint URLs.

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::ExportRequest;
use url::Url;

/// Build the HTTP client shared by the resolver and the fetcher
///
/// Every request gets the configured timeout, so a stalled backend fails the run
/// instead of hanging it.
pub fn build_http_client(config: &BackendConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| Error::Config {
            message: format!("failed to build HTTP client: {}", e),
            key: None,
        })
}

/// Export endpoint URLs below a base URL
///
/// - info: `{base}/download/{format}/{kind}/info?{filters}`
/// - part: `{base}/download/{format}/{kind}/batch/{index}?{filters}`
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Parse the base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", base_url, e),
            key: Some("backend.base_url".to_string()),
        })?;

        if base.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("base URL '{}' cannot carry a path", base_url),
                key: Some("backend.base_url".to_string()),
            });
        }

        Ok(Self { base })
    }

    /// URL of the info endpoint for a request
    pub fn info_url(&self, request: &ExportRequest) -> Url {
        self.build(request, &["info"])
    }

    /// URL of one part of a request
    pub fn part_url(&self, request: &ExportRequest, index: u32) -> Url {
        let index = index.to_string();
        self.build(request, &["batch", &index])
    }

    fn build(&self, request: &ExportRequest, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);

        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "download",
                    request.format.as_segment(),
                    request.kind.as_segment(),
                ])
                .extend(tail);
        }

        let mut pairs = request.query_pairs().peekable();
        if pairs.peek().is_some() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        url
    }
}
