//! Background workers.
//!
//! Each discovery or download runs as its own tokio task. Workers never touch
//! session state: everything they learn, success or failure, leaves through
//! their ProgressSender, and every worker ends with exactly one terminal event.

use super::channel::ProgressSender;
use super::error::SessionError;
use super::events::{Phase, ProgressEvent};
use super::history::HistoryEntry;
use super::progress::ProgressTracker;
use crate::catalog::CatalogBuilder;
use crate::extractor::{DownloadJob, Extractor, ExtractorError, ProgressUpdate};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Identity of the finished download, completed with the extractor's title
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub url: String,
    pub title: Option<String>,
    pub platform: String,
}

impl PendingRecord {
    fn into_entry(self, reported_title: Option<String>, path: &Path) -> HistoryEntry {
        let title = self
            .title
            .or(reported_title)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| self.url.clone());
        HistoryEntry::new(self.url, title, self.platform)
    }
}

pub async fn discover(
    extractor: Arc<dyn Extractor>,
    builder: CatalogBuilder,
    url: String,
    timeout: Option<Duration>,
    tx: ProgressSender,
) {
    tracing::info!(
        "Discovery worker {} started for {} via {}",
        tx.generation(),
        url,
        extractor.name()
    );

    match guarded(timeout, extractor.list_formats(&url)).await {
        Ok(discovery) => {
            let catalog = builder.build(discovery.source, &discovery.formats);
            tracing::info!(
                "Discovery worker {} finished: {} catalog entries",
                tx.generation(),
                catalog.len()
            );
            tx.send(ProgressEvent::CatalogReady(Arc::new(catalog)));
        }
        Err(e) => {
            let error = SessionError::DiscoveryFailed(e);
            tracing::error!("Discovery worker {} failed: {}", tx.generation(), error);
            tx.send(ProgressEvent::failed(error.to_string(), Phase::Discover));
        }
    }
}

pub async fn download(
    extractor: Arc<dyn Extractor>,
    job: DownloadJob,
    record: PendingRecord,
    timeout: Option<Duration>,
    tx: ProgressSender,
) {
    tracing::info!(
        "Download worker {} started: {} [{}]",
        tx.generation(),
        job.url,
        job.selector
    );

    let mut tracker = ProgressTracker::with_streams(job.stream_count());
    let progress_tx = tx.clone();
    let mut on_progress = move |update: ProgressUpdate| {
        if let Some(event) = tracker.observe(&update) {
            progress_tx.send(event);
        }
    };

    match guarded(timeout, extractor.download(&job, &mut on_progress)).await {
        Ok(outcome) => {
            let entry = record.into_entry(outcome.title, &outcome.path);
            tracing::info!(
                "Download worker {} finished: {:?}",
                tx.generation(),
                outcome.path
            );
            tx.send(ProgressEvent::DownloadFinished {
                path: outcome.path,
                record: entry,
            });
        }
        Err(e) => {
            let error = SessionError::DownloadFailed(e);
            tracing::error!("Download worker {} failed: {}", tx.generation(), error);
            tx.send(ProgressEvent::failed(error.to_string(), Phase::Download));
        }
    }
}

/// Runs an extractor call under the optional watchdog, turning panics into errors
async fn guarded<T, F>(timeout: Option<Duration>, call: F) -> Result<T, ExtractorError>
where
    F: Future<Output = Result<T, ExtractorError>>,
{
    let call = AssertUnwindSafe(call).catch_unwind();
    let caught = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ExtractorError::TimedOut(limit.as_secs()))?,
        None => call.await,
    };
    match caught {
        Ok(result) => result,
        Err(panic) => Err(ExtractorError::Panicked(panic_message(panic))),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
