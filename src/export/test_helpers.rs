//! Shared test helpers: scripted components and orchestrator construction.

use crate::config::Config;
use crate::error::ExportError;
use crate::export::{DownloadSink, ExportOrchestrator, InfoResolver, PartFetcher};
use crate::types::{ExportInfo, ExportPart, ExportRequest, SavedPart};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::Notify;

/// Resolver returning a fixed answer
pub(crate) struct ScriptedResolver {
    result: Result<ExportInfo, ExportError>,
    pub(crate) requests: Mutex<Vec<ExportRequest>>,
}

impl ScriptedResolver {
    pub(crate) fn parts(total_parts: u32) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(ExportInfo { total_parts }),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(error: ExportError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl InfoResolver for ScriptedResolver {
    async fn get_info(&self, request: &ExportRequest) -> Result<ExportInfo, ExportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

/// Pauses a fetch of one part until released
pub(crate) struct Gate {
    pub(crate) part: u32,
    /// Notified when the fetch of `part` has started
    pub(crate) entered: Arc<Notify>,
    /// Notify to let the fetch of `part` finish
    pub(crate) release: Arc<Notify>,
}

impl Gate {
    pub(crate) fn at(part: u32) -> Self {
        Self {
            part,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

/// Fetcher producing small payloads, with scripted failures and an optional gate
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    failures: HashMap<u32, ExportError>,
    gate: Option<Gate>,
    delay: Duration,
    pub(crate) fetched: Mutex<Vec<u32>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_at(mut self, part: u32, error: ExportError) -> Self {
        self.failures.insert(part, error);
        self
    }

    pub(crate) fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn fetched(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PartFetcher for ScriptedFetcher {
    async fn fetch_part(
        &self,
        index: u32,
        request: &ExportRequest,
    ) -> Result<ExportPart, ExportError> {
        self.fetched.lock().unwrap().push(index);

        if let Some(gate) = self.gate.as_ref().filter(|g| g.part == index) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(error) = self.failures.get(&index) {
            return Err(error.clone());
        }

        Ok(ExportPart {
            index,
            bytes: bytes::Bytes::from(format!("part {index}")),
            filename: request.fallback_filename(index),
        })
    }
}

/// Sink recording saved parts without touching the filesystem
#[derive(Default)]
pub(crate) struct RecordingSink {
    fail_at: Option<u32>,
    pub(crate) saved: Mutex<Vec<SavedPart>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_at(part: u32) -> Self {
        Self {
            fail_at: Some(part),
            ..Self::default()
        }
    }

    pub(crate) fn saved_indices(&self) -> Vec<u32> {
        self.saved.lock().unwrap().iter().map(|p| p.index).collect()
    }
}

#[async_trait]
impl DownloadSink for RecordingSink {
    async fn save(&self, part: ExportPart) -> Result<SavedPart, ExportError> {
        if self.fail_at == Some(part.index) {
            return Err(ExportError::Sink {
                part: part.index,
                path: None,
                message: "disk full".to_string(),
            });
        }

        let saved = SavedPart {
            index: part.index,
            path: PathBuf::from("/virtual").join(&part.filename),
            bytes: part.bytes.len() as u64,
        };
        self.saved.lock().unwrap().push(saved.clone());
        Ok(saved)
    }
}

/// Config pointing at a temp download dir with no pacing delays
pub(crate) fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.export.download_dir = temp_dir.path().join("exports");
    config.export.inter_part_delay = Duration::ZERO;
    config.export.sink_grace_period = Duration::ZERO;
    config
}

/// Build an orchestrator from scripted components.
/// Returns the orchestrator and the tempdir (which must be kept alive).
pub(crate) fn create_test_orchestrator(
    resolver: Arc<dyn InfoResolver>,
    fetcher: Arc<dyn PartFetcher>,
    sink: Arc<dyn DownloadSink>,
) -> (ExportOrchestrator, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let orchestrator = ExportOrchestrator::with_components(config, resolver, fetcher, sink);
    (orchestrator, temp_dir)
}

/// Wait until `orchestrator` has no active run
pub(crate) async fn wait_until_idle(orchestrator: &ExportOrchestrator) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while orchestrator.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("run did not finish in time");
}
