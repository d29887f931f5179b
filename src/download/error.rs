use super::history::HistoryError;
use crate::extractor::ExtractorError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the download session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Listing formats failed
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(ExtractorError),

    /// Downloading failed
    #[error("Download failed: {0}")]
    DownloadFailed(ExtractorError),

    /// Selected entry is not in the current catalog
    #[error("Format '{0}' is not in the current catalog")]
    InvalidSelection(String),

    /// Another operation is in flight
    #[error("Another operation is already in progress")]
    Busy,

    /// History could not be written; never fatal
    #[error("History persistence failed: {0}")]
    PersistenceFailed(#[from] HistoryError),

    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Download directory {path:?} is not usable: {message}")]
    Directory { path: PathBuf, message: String },
}
