use super::history::HistoryEntry;
use crate::catalog::Catalog;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Download,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Discover => f.write_str("discover"),
            Phase::Download => f.write_str("download"),
        }
    }
}

/// Lifecycle event produced by a worker (or a rejected command) for the surface
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Discovery finished; the catalog may be empty
    CatalogReady(Arc<Catalog>),
    DownloadProgress {
        /// 0.0 to 1.0, non-decreasing within one download
        fraction: f64,
        /// Bytes per second
        speed: Option<f64>,
    },
    /// Download finished; `record` is already in history when the surface sees this
    DownloadFinished { path: PathBuf, record: HistoryEntry },
    Failed { message: String, phase: Phase },
    /// A request was rejected because an operation is already in flight
    Busy,
}

impl ProgressEvent {
    pub fn failed(message: impl Into<String>, phase: Phase) -> Self {
        ProgressEvent::Failed {
            message: message.into(),
            phase,
        }
    }

    /// Structural events are never coalesced or dropped
    pub fn is_progress(&self) -> bool {
        matches!(self, ProgressEvent::DownloadProgress { .. })
    }

    /// True for events that end a worker's lifetime
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::CatalogReady(_)
                | ProgressEvent::DownloadFinished { .. }
                | ProgressEvent::Failed { .. }
        )
    }
}

/// An event tagged with the generation of the worker that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: u64,
    pub event: ProgressEvent,
}
