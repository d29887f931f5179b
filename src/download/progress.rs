use super::events::ProgressEvent;
use crate::extractor::{ProgressUpdate, TransferStatus};

/// Wraps raw extractor callbacks so the reported fraction is clamped to
/// `0.0..=1.0` and never moves backwards within one download.
///
/// A selector joining several streams (video, then audio) is reported as one
/// transfer: each stream owns an equal share and the extractor restarting its
/// byte count for the next stream continues from the finished shares.
#[derive(Debug)]
pub struct ProgressTracker {
    streams: u32,
    completed: u32,
    last: f64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::with_streams(1)
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_streams(streams: u32) -> Self {
        Self {
            streams: streams.max(1),
            completed: 0,
            last: 0.0,
        }
    }

    /// Converts an update into an event, or `None` when no total is known yet
    pub fn observe(&mut self, update: &ProgressUpdate) -> Option<ProgressEvent> {
        let current = match update.status {
            TransferStatus::Finished => 1.0,
            TransferStatus::Downloading => {
                let total = update.effective_total().filter(|t| *t > 0)?;
                update.downloaded_bytes as f64 / total as f64
            }
        };
        let current = if current.is_finite() { current.clamp(0.0, 1.0) } else { 0.0 };

        let done = self.completed.min(self.streams - 1);
        let raw = (done as f64 + current) / self.streams as f64;
        if update.status == TransferStatus::Finished {
            self.completed += 1;
        }

        self.last = self.last.max(raw.clamp(0.0, 1.0));

        Some(ProgressEvent::DownloadProgress {
            fraction: self.last,
            speed: update.speed.filter(|s| s.is_finite() && *s >= 0.0),
        })
    }
}

/// `Downloading... 42% (1.3 MB/s)`
pub fn progress_display(fraction: f64, speed: Option<f64>) -> String {
    let percent = (fraction * 100.0) as u32;
    match speed {
        Some(bps) => format!(
            "Downloading... {}% ({:.1} MB/s)",
            percent,
            bps / (1024.0 * 1024.0)
        ),
        None => format!("Downloading... {}%", percent),
    }
}
