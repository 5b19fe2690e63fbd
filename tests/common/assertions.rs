//! Custom test assertions for integration tests

use export_dl::{Event, ExportOrchestrator};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use walkdir::WalkDir;

/// Wait for the terminal event of the current run
///
/// Returns the event, or `None` on timeout or a closed channel.
pub async fn wait_for_terminal(events: &mut Receiver<Event>, timeout: Duration) -> Option<Event> {
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(
                    event @ (Event::RunCompleted { .. }
                    | Event::RunFailed { .. }
                    | Event::RunCancelled { .. }),
                ) => return Some(event),
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Wait until the part with `index` has started
pub async fn wait_for_part_started(
    events: &mut Receiver<Event>,
    index: u32,
    timeout: Duration,
) -> bool {
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::PartStarted { index: started, .. }) if started == index => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await
    .unwrap_or(false)
}

/// Wait until the orchestrator has no active run
pub async fn wait_until_idle(orchestrator: &ExportOrchestrator, timeout: Duration) {
    tokio::time::timeout(timeout, async {
        while orchestrator.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("export did not finish in time");
}

/// Files under `dir`, sorted by name
pub fn saved_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// File names under `dir`, sorted
pub fn saved_file_names(dir: &Path) -> Vec<String> {
    saved_files(dir)
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

/// Assert no staging file was left behind in `dir`
pub fn assert_no_staging_files(dir: &Path) {
    let leftovers: Vec<_> = saved_file_names(dir)
        .into_iter()
        .filter(|name| name.ends_with(".partial"))
        .collect();
    assert!(
        leftovers.is_empty(),
        "staging files left behind: {leftovers:?}"
    );
}
