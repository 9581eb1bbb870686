//! Snapshot cache: the live snapshot plus write-once daily archives.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use paperfeed_common::paper::{self, PaperRecord};
use paperfeed_common::PaperError;

use crate::date_index::{file_name_for, DateIndex};
use crate::error::{Result, StoreError};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Where a loaded snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Live,
    Archive(NaiveDate),
}

/// A parsed snapshot. Keys of the on-disk object are discarded; papers are
/// identified by their normalised id.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub source: SnapshotSource,
    records: Vec<Value>,
}

impl Snapshot {
    pub fn from_slice(source: SnapshotSource, bytes: &[u8], label: &str) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| StoreError::Malformed {
            path: label.to_string(),
            source: e,
        })?;
        match value {
            Value::Object(map) => Ok(Self {
                source,
                records: map.into_iter().map(|(_, v)| v).collect(),
            }),
            _ => Err(StoreError::NotAnObject(label.to_string())),
        }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Normalise every record; one bad record fails the whole snapshot.
    pub fn papers(&self) -> std::result::Result<Vec<PaperRecord>, PaperError> {
        paper::normalize_all(&self.records)
    }

    /// The paper with `id`. A matching record that cannot be normalised is
    /// an error.
    pub fn find(&self, id: &str) -> std::result::Result<Option<PaperRecord>, PaperError> {
        paper::find_by_id(&self.records, id)
    }
}

/// File-system backed snapshot cache.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    live_path: PathBuf,
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(live_path: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self { live_path: live_path.into(), cache_dir: cache_dir.into() }
    }

    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(file_name_for(date))
    }

    pub async fn has_archive(&self, date: NaiveDate) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.archive_path(date)).await?)
    }

    /// Archive the live snapshot under today's local date.
    pub async fn ensure_today_cached(&self) -> Result<bool> {
        self.ensure_cached_for(Local::now().date_naive()).await
    }

    /// Copy the live snapshot verbatim into the archive for `date`, unless
    /// that archive already exists or there is no live snapshot.
    ///
    /// Returns `true` when this call wrote the archive. The archive appears
    /// atomically via a hard link from a private temp file, so a concurrent
    /// caller either wins the link or sees `AlreadyExists`; an existing
    /// archive is never replaced.
    pub async fn ensure_cached_for(&self, date: NaiveDate) -> Result<bool> {
        if !tokio::fs::try_exists(&self.live_path).await? {
            tracing::debug!(path = %self.live_path.display(), "no live snapshot to archive");
            return Ok(false);
        }
        let target = self.archive_path(date);
        if tokio::fs::try_exists(&target).await? {
            return Ok(false);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let bytes = tokio::fs::read(&self.live_path).await?;

        let tmp = self.cache_dir.join(format!(
            ".{}.tmp-{}-{}",
            file_name_for(date),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        ));
        write_new(&tmp, &bytes).await?;
        let linked = tokio::fs::hard_link(&tmp, &target).await;
        remove_temp(&tmp).await;

        match linked {
            Ok(()) => {
                tracing::info!(archive = %target.display(), bytes = bytes.len(), "archived live snapshot");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(archive = %target.display(), "archive created concurrently");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every archived date, most recent first. A missing cache directory is
    /// an empty index.
    pub async fn list_dates(&self) -> Result<DateIndex> {
        let mut dir = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DateIndex::default()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(DateIndex::from_file_names(names))
    }

    /// The archive for `date` when one exists, otherwise the live snapshot.
    pub async fn load(&self, date: Option<NaiveDate>) -> Result<Snapshot> {
        if let Some(date) = date {
            if self.has_archive(date).await? {
                return self.load_archive(date).await;
            }
            tracing::debug!(%date, "no archive for requested date, falling back to live snapshot");
        }
        self.load_live().await
    }

    pub async fn load_live(&self) -> Result<Snapshot> {
        read_snapshot(&self.live_path, SnapshotSource::Live).await
    }

    pub async fn load_archive(&self, date: NaiveDate) -> Result<Snapshot> {
        read_snapshot(&self.archive_path(date), SnapshotSource::Archive(date)).await
    }

    /// Number of papers in the archive for `date`.
    pub async fn count_papers(&self, date: NaiveDate) -> Result<usize> {
        Ok(self.load_archive(date).await?.len())
    }
}

/// Create `path` exclusively and fill it with `bytes`.
async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    fill_temp(file, path, bytes).await
}

/// Write and sync `bytes`. On failure the temp file at `path` is removed.
async fn fill_temp(mut file: tokio::fs::File, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let written = async {
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;
    drop(file);
    if written.is_err() {
        remove_temp(path).await;
    }
    written
}

async fn remove_temp(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove temp archive");
    }
}

async fn read_snapshot(path: &Path, source: SnapshotSource) -> Result<Snapshot> {
    let label = path.display().to_string();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(label));
        }
        Err(e) => return Err(e.into()),
    };
    Snapshot::from_slice(source, &bytes, &label)
}
