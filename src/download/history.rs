//! Download history module
//!
//! URL-deduplicated record of completed downloads, persisted as JSON and
//! reloaded at startup. A missing or corrupt file loads as an empty history.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One completed download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique key
    pub url: String,
    pub title: String,
    pub platform: String,
    /// ISO-8601 completion time
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
}

/// Zone-less timestamps written by earlier desktop versions, read as UTC
const NAIVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, NAIVE_DATE_FORMAT).map(|date| date.and_utc()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(raw.trim()).map_err(serde::de::Error::custom)
}

impl HistoryEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            platform: platform.into(),
            date: Utc::now(),
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

/// What `append` does with a URL that is already recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the existing entry untouched
    #[default]
    Ignore,
    /// Replace title, platform and date without moving the entry
    Update,
}

/// History persistence failure; callers log it and carry on
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to write history file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk layout; older files stored the bare array
#[derive(Debug, Default, Serialize)]
struct HistoryFile {
    entries: Vec<HistoryEntry>,
}

/// Download history storage
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    on_duplicate: DuplicatePolicy,
}

impl HistoryStore {
    /// Opens the store at `path`, loading whatever is already there
    pub fn open(path: impl Into<PathBuf>, on_duplicate: DuplicatePolicy) -> Self {
        let path = path.into();
        let entries = Self::load(&path);
        tracing::debug!("Loaded {} history entries from {:?}", entries.len(), path);
        Self {
            path,
            entries,
            on_duplicate,
        }
    }

    /// Reads entries from disk; never fails
    pub fn load(path: &Path) -> Vec<HistoryEntry> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read history {:?}: {}", path, e);
                return Vec::new();
            }
        };

        let records = match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Array(records)) => records,
            Ok(serde_json::Value::Object(mut file)) => match file.remove("entries") {
                Some(serde_json::Value::Array(records)) => records,
                _ => {
                    tracing::warn!("History {:?} has no entry list, starting empty", path);
                    return Vec::new();
                }
            },
            Ok(_) => {
                tracing::warn!("Discarding history {:?}: unexpected layout", path);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Discarding malformed history {:?}: {}", path, e);
                return Vec::new();
            }
        };

        // A broken record costs only itself
        let entries = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping history record {} in {:?}: {}", index, path, e);
                    None
                }
            })
            .collect();
        dedupe(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in storage (insertion) order
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entries for display: newest first, later insertions first on equal dates
    pub fn newest_first(&self) -> Vec<&HistoryEntry> {
        let mut indexed: Vec<(usize, &HistoryEntry)> = self.entries.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| b.date.cmp(&a.date).then(ib.cmp(ia)));
        indexed.into_iter().map(|(_, e)| e).collect()
    }

    pub fn find(&self, url: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.url == url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a download and persists before returning.
    ///
    /// The in-memory list is updated even when writing fails.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<&[HistoryEntry], HistoryError> {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.url == entry.url) {
            match self.on_duplicate {
                DuplicatePolicy::Ignore => {
                    tracing::debug!("History already contains {}, ignoring", entry.url);
                    return Ok(&self.entries);
                }
                DuplicatePolicy::Update => {
                    tracing::debug!("Updating history entry for {}", entry.url);
                    *existing = entry;
                }
            }
        } else {
            self.entries.push(entry);
        }

        self.save()?;
        Ok(&self.entries)
    }

    /// Empties the store and rewrites the file
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();
        self.save()
    }

    /// Writes to a temp file, syncs, then renames over the target
    fn save(&self) -> Result<(), HistoryError> {
        let io_err = |source| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        let content = serde_json::to_string_pretty(&HistoryFile {
            entries: self.entries.clone(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&temp_path, &self.path).map_err(io_err)?;

        tracing::debug!("Saved {} history entries to {:?}", self.entries.len(), self.path);
        Ok(())
    }
}

/// Keeps the first entry per URL
fn dedupe(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.url.clone()))
        .collect()
}
