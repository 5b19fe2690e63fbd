//! Test configuration helpers for creating orchestrators against a mock backend

use export_dl::{Config, ExportOrchestrator};
use std::time::Duration;
use tempfile::TempDir;

/// Config pointing at `base_url` with a temp download dir and no pacing
pub fn test_config(base_url: &str, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.backend.base_url = base_url.to_string();
    config.backend.request_timeout = Duration::from_secs(5);
    config.export.download_dir = temp_dir.path().join("exports");
    config.export.inter_part_delay = Duration::ZERO;
    config.export.sink_grace_period = Duration::from_millis(5);
    config
}

/// Create an HTTP-backed orchestrator for `base_url`.
/// Returns the orchestrator and the tempdir (which must be kept alive).
pub async fn create_test_orchestrator(base_url: &str) -> (ExportOrchestrator, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(base_url, &temp_dir);
    let orchestrator = ExportOrchestrator::new(config)
        .await
        .expect("Failed to create orchestrator");
    (orchestrator, temp_dir)
}

/// Same as [`create_test_orchestrator`] with a config tweak applied first
pub async fn create_test_orchestrator_with(
    base_url: &str,
    tweak: impl FnOnce(&mut Config),
) -> (ExportOrchestrator, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(base_url, &temp_dir);
    tweak(&mut config);
    let orchestrator = ExportOrchestrator::new(config)
        .await
        .expect("Failed to create orchestrator");
    (orchestrator, temp_dir)
}
