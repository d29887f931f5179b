//! Download Session
//!
//! Owns every piece of UI-visible state (lifecycle state, catalog, history)
//! and is its only writer. Commands (`fetch`, `download`, `download_best`)
//! are validated synchronously and spawn one worker each; worker results come
//! back through the Progress Channel and are applied by `poll` or
//! `next_event` on the consumer side.
//!
//! ```text
//! Idle ──fetch──▶ Discovering ──ok──▶ CatalogReady ──download──▶ Downloading ──▶ Idle
//!                     └──err──▶ Idle                                  └──err──▶ Idle
//! ```

use super::channel::ProgressChannel;
use super::error::SessionError;
use super::events::{Envelope, Phase, ProgressEvent};
use super::history::HistoryStore;
use super::request::{self, DownloadRequest};
use super::worker::{self, PendingRecord};
use crate::app::config::Config;
use crate::catalog::{Catalog, CatalogBuilder};
use crate::extractor::{DownloadJob, Extractor};
use crate::util::platform::platform_label;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Discovering,
    CatalogReady,
    Downloading,
}

impl SessionState {
    /// True while a worker is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Discovering | SessionState::Downloading)
    }
}

/// Knobs taken from configuration
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub download_dir: PathBuf,
    pub auto_create_directory: bool,
    pub merge_output_format: String,
    /// Watchdog for extractor calls; none by default
    pub extractor_timeout: Option<Duration>,
}

impl SessionOptions {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            auto_create_directory: true,
            merge_output_format: "mp4".to_string(),
            extractor_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            download_dir: config.download.directory.clone(),
            auto_create_directory: config.download.auto_create_directory,
            merge_output_format: config.download.merge_output_format.clone(),
            extractor_timeout: config.extractor.timeout_secs.map(Duration::from_secs),
        }
    }
}

pub struct DownloadSession {
    extractor: Arc<dyn Extractor>,
    builder: CatalogBuilder,
    history: HistoryStore,
    options: SessionOptions,
    channel: ProgressChannel,
    state: SessionState,
    generation: u64,
    url: Option<String>,
    catalog: Option<Arc<Catalog>>,
}

impl DownloadSession {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        builder: CatalogBuilder,
        history: HistoryStore,
        options: SessionOptions,
    ) -> Self {
        Self {
            extractor,
            builder,
            history,
            options,
            channel: ProgressChannel::new(),
            state: SessionState::Idle,
            generation: 0,
            url: None,
            catalog: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Generation of the most recently spawned worker
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// URL of the current discovery or download
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_deref()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn download_dir(&self) -> &Path {
        &self.options.download_dir
    }

    pub fn set_download_dir(&mut self, directory: impl Into<PathBuf>) {
        self.options.download_dir = directory.into();
    }

    /// Starts format discovery for `url`, discarding the previous catalog
    pub fn fetch(&mut self, url: &str) -> Result<u64, SessionError> {
        if self.is_busy() {
            return Err(self.reject_busy());
        }
        if let Err(e) = request::validate_url(url) {
            return Err(self.reject(e, Phase::Discover));
        }

        let url = url.trim().to_string();
        let generation = self.advance(SessionState::Discovering);
        self.url = Some(url.clone());
        self.catalog = None;
        tracing::info!("Discovering formats for {} (generation {})", url, generation);

        tokio::spawn(worker::discover(
            Arc::clone(&self.extractor),
            self.builder.clone(),
            url,
            self.options.extractor_timeout,
            self.channel.sender(generation),
        ));
        Ok(generation)
    }

    /// Downloads one entry of the current catalog
    pub fn download(&mut self, format_id: &str) -> Result<u64, SessionError> {
        if self.is_busy() {
            return Err(self.reject_busy());
        }

        let catalog = self.catalog.clone();
        let request = DownloadRequest::new(
            self.url.clone().unwrap_or_default(),
            format_id,
            self.options.download_dir.clone(),
        );
        let entry = match request.validate(catalog.as_deref(), self.options.auto_create_directory) {
            Ok(entry) => entry,
            Err(e) => return Err(self.reject(e, Phase::Download)),
        };

        let job = request.job(entry, &self.options.merge_output_format);
        let title = catalog.as_ref().map(|c| c.source.title.clone());
        Ok(self.start_download(job, title))
    }

    /// Downloads the extractor's best single-file format without discovery
    pub fn download_best(&mut self, url: &str) -> Result<u64, SessionError> {
        if self.is_busy() {
            return Err(self.reject_busy());
        }
        if let Err(e) = request::validate_url(url).and_then(|_| {
            request::resolve_directory(&self.options.download_dir, self.options.auto_create_directory)
        }) {
            return Err(self.reject(e, Phase::Download));
        }

        let url = url.trim();
        if self.url.as_deref() != Some(url) {
            self.catalog = None;
        }
        self.url = Some(url.to_string());

        let job = request::best_job(url, &self.options.download_dir);
        Ok(self.start_download(job, None))
    }

    fn start_download(&mut self, job: DownloadJob, title: Option<String>) -> u64 {
        let generation = self.advance(SessionState::Downloading);
        tracing::info!(
            "Downloading {} with selector '{}' (generation {})",
            job.url,
            job.selector,
            generation
        );

        let record = PendingRecord {
            url: job.url.clone(),
            title,
            platform: platform_label(&job.url),
        };
        tokio::spawn(worker::download(
            Arc::clone(&self.extractor),
            job,
            record,
            self.options.extractor_timeout,
            self.channel.sender(generation),
        ));
        generation
    }

    fn advance(&mut self, state: SessionState) -> u64 {
        self.generation += 1;
        self.state = state;
        self.generation
    }

    /// Reports a rejected command on the channel without touching state
    fn reject(&self, error: SessionError, phase: Phase) -> SessionError {
        tracing::warn!("Request rejected: {}", error);
        self.channel
            .sender(self.generation)
            .send(ProgressEvent::failed(error.to_string(), phase));
        error
    }

    fn reject_busy(&self) -> SessionError {
        tracing::debug!("Request rejected while {:?}", self.state);
        self.channel.sender(self.generation).send(ProgressEvent::Busy);
        SessionError::Busy
    }

    /// Supersedes the in-flight worker, if any, and returns to Idle.
    ///
    /// The worker keeps running; its late events are discarded.
    pub fn reset(&mut self) {
        let was = self.state;
        self.advance(SessionState::Idle);
        tracing::info!("Session reset from {:?} (generation {})", was, self.generation);
    }

    /// Applies everything queued so far and returns the events to render
    pub fn poll(&mut self) -> Vec<ProgressEvent> {
        self.channel
            .drain()
            .into_iter()
            .filter_map(|envelope| self.apply(envelope))
            .collect()
    }

    /// Waits for the next current-generation event and applies it
    pub async fn next_event(&mut self) -> ProgressEvent {
        loop {
            let envelope = self.channel.recv().await;
            if let Some(event) = self.apply(envelope) {
                return event;
            }
        }
    }

    fn apply(&mut self, envelope: Envelope) -> Option<ProgressEvent> {
        if envelope.generation != self.generation {
            tracing::debug!(
                "Discarding event from superseded worker {} (current {})",
                envelope.generation,
                self.generation
            );
            return None;
        }

        match &envelope.event {
            ProgressEvent::CatalogReady(catalog) => {
                self.catalog = Some(Arc::clone(catalog));
                self.state = SessionState::CatalogReady;
            }
            ProgressEvent::DownloadFinished { record, .. } => {
                if let Err(e) = self.history.append(record.clone()) {
                    tracing::warn!("{}", SessionError::from(e));
                }
                self.state = SessionState::Idle;
            }
            ProgressEvent::Failed { phase, message } => {
                // Synchronous rejections arrive while not busy and leave state alone
                if self.state.is_busy() {
                    tracing::info!("{} phase failed: {}", phase, message);
                    self.state = SessionState::Idle;
                }
            }
            ProgressEvent::DownloadProgress { .. } | ProgressEvent::Busy => {}
        }

        Some(envelope.event)
    }

    pub fn clear_history(&mut self) -> Result<(), SessionError> {
        self.history.clear()?;
        tracing::info!("History cleared");
        Ok(())
    }
}
