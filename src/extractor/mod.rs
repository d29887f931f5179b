//! Extractor Adapter boundary.
//!
//! The engine never talks to a media site itself: listing formats and moving
//! bytes are delegated to an [`Extractor`]. The crate ships one adapter,
//! [`ytdlp::YtDlp`], which drives the `yt-dlp` executable.

pub mod error;
pub mod ytdlp;

use crate::catalog::descriptor::{FormatDescriptor, SourceInfo};
use async_trait::async_trait;
use std::path::PathBuf;

pub use error::ExtractorError;

/// Result of a list-formats call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Discovery {
    pub source: SourceInfo,
    pub formats: Vec<FormatDescriptor>,
}

/// Transfer state reported by the extractor's progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Downloading,
    Finished,
}

/// One raw progress callback from the extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub status: TransferStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    /// Instantaneous speed in bytes per second
    pub speed: Option<f64>,
}

impl ProgressUpdate {
    pub fn downloading(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            status: TransferStatus::Downloading,
            downloaded_bytes,
            total_bytes,
            total_bytes_estimate: None,
            speed: None,
        }
    }

    pub fn finished(downloaded_bytes: u64) -> Self {
        Self {
            status: TransferStatus::Finished,
            downloaded_bytes,
            total_bytes: Some(downloaded_bytes),
            total_bytes_estimate: None,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_estimate(mut self, estimate: u64) -> Self {
        self.total_bytes_estimate = Some(estimate);
        self
    }

    /// Exact total, falling back to the estimate
    pub fn effective_total(&self) -> Option<u64> {
        self.total_bytes.or(self.total_bytes_estimate)
    }
}

/// Everything the extractor needs to perform one download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    pub url: String,
    /// Format selector, e.g. `137+bestaudio`
    pub selector: String,
    /// Destination path template, e.g. `/dl/%(title)s_1080p.%(ext)s`
    pub output_template: String,
    /// Container to merge separate streams into
    pub merge_format: Option<String>,
}

impl DownloadJob {
    /// Number of separate transfers the selector asks for (`137+bestaudio` is two)
    pub fn stream_count(&self) -> u32 {
        let primary = self.selector.split('/').next().unwrap_or_default();
        primary.split('+').filter(|part| !part.trim().is_empty()).count().max(1) as u32
    }
}

/// What a finished download produced
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    /// Source title, when the extractor reported one
    pub title: Option<String>,
}

/// Progress sink handed to [`Extractor::download`]
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(ProgressUpdate) + Send);

/// External media-extraction engine
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the adapter (for logging)
    fn name(&self) -> &'static str;

    /// Lists the formats available for a URL
    async fn list_formats(&self, url: &str) -> Result<Discovery, ExtractorError>;

    /// Downloads one selection, reporting progress through `on_progress`
    async fn download(
        &self,
        job: &DownloadJob,
        on_progress: ProgressCallback<'_>,
    ) -> Result<DownloadOutcome, ExtractorError>;
}
