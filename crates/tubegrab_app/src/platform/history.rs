use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tubegrab_core::{CompletedDownload, DownloadKind};
use tubegrab_logging::{tg_error, tg_info, tg_warn};

const HISTORY_FILENAME: &str = ".tubegrab_history.ron";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history directory unusable: {0}")]
    Dir(String),
    #[error("could not serialize history: {0}")]
    Serialize(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: Option<String>,
    pub format_id: String,
    pub audio: bool,
    pub playlist: bool,
    pub download_url: Option<String>,
    pub file_name: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_completed(done: &CompletedDownload, finished_at: DateTime<Utc>) -> Self {
        Self {
            url: done.url.clone(),
            title: done.title.clone(),
            format_id: done.format_id.clone(),
            audio: done.kind == DownloadKind::Audio,
            playlist: done.playlist,
            download_url: done.download_url.clone(),
            file_name: done.file_name.clone(),
            finished_at,
        }
    }

    /// One-line summary for the `history` command.
    pub fn summary(&self) -> String {
        let what = self.title.as_deref().unwrap_or(&self.url);
        let kind = if self.audio { "audio" } else { "video" };
        let file = self.file_name.as_deref().unwrap_or("-");
        format!(
            "{} {} [{} {}] {}",
            self.finished_at.format("%Y-%m-%d %H:%M"),
            what,
            kind,
            self.format_id,
            file
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    completed: Vec<HistoryEntry>,
}

/// Completed downloads kept in `<dir>/.tubegrab_history.ron`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILENAME)
    }

    /// Reads all entries. A missing or unreadable file yields an empty list.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tg_warn!("Failed to read history from {:?}: {}", path, err);
                return Vec::new();
            }
        };

        match ron::from_str::<HistoryFile>(&content) {
            Ok(file) => file.completed,
            Err(err) => {
                tg_warn!("Failed to parse history from {:?}: {}", path, err);
                Vec::new()
            }
        }
    }

    pub fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut completed = self.load();
        completed.push(entry);
        self.write(&HistoryFile { completed })?;
        tg_info!("Recorded completed download in {:?}", self.path());
        Ok(())
    }

    fn write(&self, file: &HistoryFile) -> Result<(), HistoryError> {
        ensure_dir(&self.dir)?;

        let content = ron::ser::to_string_pretty(file, ron::ser::PrettyConfig::new())
            .map_err(|err| HistoryError::Serialize(err.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(self.path())
            .map_err(|err| HistoryError::Io(err.error))?;
        Ok(())
    }
}

/// Appends history entries on a background thread so the dispatcher never
/// waits on the disk.
pub struct HistoryWriter {
    tx: Option<mpsc::Sender<HistoryEntry>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl HistoryWriter {
    pub fn spawn(store: HistoryStore) -> Self {
        let (tx, rx) = mpsc::channel::<HistoryEntry>();
        let worker = thread::spawn(move || {
            for entry in rx {
                if let Err(err) = store.append(entry) {
                    tg_error!("Failed to record completed download: {}", err);
                }
            }
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    pub fn record(&self, entry: HistoryEntry) {
        let sent = self.tx.as_ref().is_some_and(|tx| tx.send(entry).is_ok());
        if !sent {
            tg_error!("History writer is stopped; completed download not recorded");
        }
    }

    /// Closes the queue and waits until every queued entry is on disk.
    pub fn finish(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tg_error!("History writer thread panicked");
            }
        }
    }
}

impl Drop for HistoryWriter {
    fn drop(&mut self) {
        self.finish();
    }
}

fn ensure_dir(dir: &Path) -> Result<(), HistoryError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| HistoryError::Dir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(HistoryError::Dir("path is not a directory".into()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| HistoryError::Dir(e.to_string()))
}
