//! Persisting fetched parts to disk.
//!
//! Each part is written to a staging file inside the download directory and then
//! moved onto its final name. The staging handle is released exactly once per part,
//! after a short grace period, whether the save succeeded or not.

use crate::config::{ExportConfig, FileCollisionAction};
use crate::error::ExportError;
use crate::types::{ExportPart, SavedPart};
use crate::utils::get_unique_path;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Persists one fetched part
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save `part`, consuming its payload
    async fn save(&self, part: ExportPart) -> Result<SavedPart, ExportError>;
}

/// Staging file counters
#[derive(Debug, Default)]
pub struct StagingStats {
    staged: AtomicUsize,
    released: AtomicUsize,
}

impl StagingStats {
    /// Staging files created
    pub fn staged(&self) -> usize {
        self.staged.load(Ordering::SeqCst)
    }

    /// Staging files released
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Staging files created but not yet released
    pub fn outstanding(&self) -> usize {
        self.staged().saturating_sub(self.released())
    }
}

/// Staging file for one part, released when dropped
struct StagedFile {
    file: Option<NamedTempFile>,
    stats: Arc<StagingStats>,
}

impl StagedFile {
    fn create(dir: &Path, stats: Arc<StagingStats>) -> std::io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(".export-")
            .suffix(".partial")
            .tempfile_in(dir)?;
        stats.staged.fetch_add(1, Ordering::SeqCst);
        Ok(Self {
            file: Some(file),
            stats,
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(bytes)?;
            file.as_file().sync_all()?;
        }
        Ok(())
    }

    /// Move the staged content onto `target`
    fn persist(&mut self, target: &Path, overwrite: bool) -> std::io::Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| std::io::Error::other("staging file already persisted"))?;

        let result = if overwrite {
            file.persist(target).map(drop)
        } else {
            file.persist_noclobber(target).map(drop)
        };
        // On failure the PersistError owns the temp file and removes it on drop
        result.map_err(|e| e.error)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // An unpersisted temp file is deleted here
        self.file.take();
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// [`DownloadSink`] writing parts into a directory
#[derive(Debug)]
pub struct FileSink {
    download_dir: PathBuf,
    collision: FileCollisionAction,
    grace_period: Duration,
    stats: Arc<StagingStats>,
}

impl FileSink {
    /// Create a sink writing into `download_dir`
    pub fn new(
        download_dir: impl Into<PathBuf>,
        collision: FileCollisionAction,
        grace_period: Duration,
    ) -> Self {
        Self {
            download_dir: download_dir.into(),
            collision,
            grace_period,
            stats: Arc::new(StagingStats::default()),
        }
    }

    /// Create a sink from the export section of the configuration
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(
            config.download_dir.clone(),
            config.file_collision,
            config.sink_grace_period,
        )
    }

    /// Staging file counters
    pub fn stats(&self) -> Arc<StagingStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl DownloadSink for FileSink {
    async fn save(&self, part: ExportPart) -> Result<SavedPart, ExportError> {
        let ExportPart {
            index,
            bytes,
            filename,
        } = part;
        let sink_error = |path: Option<PathBuf>, message: String| ExportError::Sink {
            part: index,
            path,
            message,
        };

        let target = get_unique_path(&self.download_dir.join(&filename), self.collision)
            .map_err(|e| sink_error(None, e.to_string()))?;

        let size = bytes.len() as u64;
        let dir = self.download_dir.clone();
        let stats = Arc::clone(&self.stats);
        let overwrite = self.collision == FileCollisionAction::Overwrite;
        let staged_target = target.clone();

        let staged = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)?;
            let mut staged = StagedFile::create(&dir, stats)?;
            let written = staged
                .write_all(&bytes)
                .and_then(|()| staged.persist(&staged_target, overwrite));
            Ok::<_, std::io::Error>((staged, written))
        })
        .await;

        let (staged, written) = match staged {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                return Err(sink_error(
                    Some(target),
                    format!("failed to create staging file: {}", e),
                ));
            }
            Err(e) => return Err(sink_error(Some(target), format!("save task failed: {}", e))),
        };

        tokio::time::sleep(self.grace_period).await;
        drop(staged);

        written.map_err(|e| sink_error(Some(target.clone()), e.to_string()))?;

        tracing::debug!(part = index, path = %target.display(), size, "Saved export part");

        Ok(SavedPart {
            index,
            path: target,
            bytes: size,
        })
    }
}
