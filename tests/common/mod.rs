#![allow(dead_code)]

use async_trait::async_trait;
use mediagrab::catalog::{CatalogBuilder, FormatDescriptor, SourceInfo};
use mediagrab::download::{
    DownloadSession, DuplicatePolicy, HistoryStore, ProgressEvent, SessionOptions,
};
use mediagrab::extractor::{
    Discovery, DownloadJob, DownloadOutcome, Extractor, ExtractorError, ProgressCallback,
    ProgressUpdate,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

pub const SAMPLE_URL: &str = "https://www.youtube.com/watch?v=abc123";

/// Routes session and worker logs through the test harness output
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// One scripted `download` call
#[derive(Debug, Clone)]
pub struct ScriptedDownload {
    pub progress: Vec<ProgressUpdate>,
    pub result: Result<DownloadOutcome, String>,
}

impl ScriptedDownload {
    pub fn success(path: impl Into<PathBuf>, title: Option<&str>) -> Self {
        Self {
            progress: vec![
                ProgressUpdate::downloading(100, Some(1000)).with_speed(1024.0 * 1024.0),
                ProgressUpdate::downloading(600, Some(1000)),
                ProgressUpdate::finished(1000),
                // Second stream of a joined selector restarts the byte count
                ProgressUpdate::downloading(400, Some(1000)),
                ProgressUpdate::finished(1000),
            ],
            result: Ok(DownloadOutcome {
                path: path.into(),
                title: title.map(str::to_string),
            }),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            progress: vec![ProgressUpdate::downloading(10, Some(1000))],
            result: Err(message.to_string()),
        }
    }
}

/// Extractor that replays scripted responses in call order.
///
/// Gated calls block until the test adds permits to the matching semaphore,
/// which keeps a worker in flight for as long as the test needs.
#[derive(Default)]
pub struct FakeExtractor {
    discoveries: Mutex<VecDeque<Result<Discovery, String>>>,
    downloads: Mutex<VecDeque<ScriptedDownload>>,
    jobs: Mutex<Vec<DownloadJob>>,
    discovery_gate: Option<Arc<Semaphore>>,
    download_gate: Option<Arc<Semaphore>>,
    completed: AtomicUsize,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discovery(self, discovery: Result<Discovery, &str>) -> Self {
        self.discoveries
            .lock()
            .unwrap()
            .push_back(discovery.map_err(str::to_string));
        self
    }

    pub fn with_download(self, download: ScriptedDownload) -> Self {
        self.downloads.lock().unwrap().push_back(download);
        self
    }

    /// Discovery calls wait for a permit on the returned semaphore
    pub fn gate_discovery(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.discovery_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Download calls wait for a permit after reporting progress
    pub fn gate_download(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.download_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Jobs passed to `download`, in call order
    pub fn jobs(&self) -> Vec<DownloadJob> {
        self.jobs.lock().unwrap().clone()
    }

    /// Number of calls that have returned
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    async fn pass(gate: &Option<Arc<Semaphore>>) {
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list_formats(&self, _url: &str) -> Result<Discovery, ExtractorError> {
        Self::pass(&self.discovery_gate).await;
        let scripted = self.discoveries.lock().unwrap().pop_front();
        self.completed.fetch_add(1, Ordering::SeqCst);
        scripted
            .unwrap_or_else(|| Err("no scripted discovery".to_string()))
            .map_err(|message| ExtractorError::failed(Some(1), message))
    }

    async fn download(
        &self,
        job: &DownloadJob,
        on_progress: ProgressCallback<'_>,
    ) -> Result<DownloadOutcome, ExtractorError> {
        self.jobs.lock().unwrap().push(job.clone());
        let scripted = self.downloads.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            self.completed.fetch_add(1, Ordering::SeqCst);
            return Err(ExtractorError::failed(Some(1), "no scripted download"));
        };

        for update in scripted.progress {
            on_progress(update);
            tokio::task::yield_now().await;
        }
        Self::pass(&self.download_gate).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        scripted
            .result
            .map_err(|message| ExtractorError::failed(Some(1), message))
    }
}

/// Formats from a typical video page: muxed, video-only, audio-only, a webm
/// video track and a storyboard that must be filtered out.
pub fn sample_discovery() -> Discovery {
    Discovery {
        source: SourceInfo::new("Sample Clip", Some(125.0)),
        formats: vec![
            FormatDescriptor::new("sb0", "mhtml")
                .with_video("images", None)
                .with_note("storyboard"),
            FormatDescriptor::new("140", "m4a")
                .with_audio("mp4a.40.2")
                .with_filesize(3 * 1024 * 1024),
            FormatDescriptor::new("22", "mp4")
                .with_video("avc1.64001F", Some(720))
                .with_audio("mp4a.40.2")
                .with_fps(30.0),
            FormatDescriptor::new("137", "mp4")
                .with_video("avc1.640028", Some(1080))
                .with_fps(30.0)
                .with_filesize_approx(50 * 1024 * 1024),
            FormatDescriptor::new("248", "webm")
                .with_video("vp9", Some(1080))
                .with_fps(30.0),
        ],
    }
}

pub struct Harness {
    pub session: DownloadSession,
    pub extractor: Arc<FakeExtractor>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(extractor: FakeExtractor) -> Self {
        Self::with_policy(extractor, DuplicatePolicy::Ignore)
    }

    pub fn with_policy(extractor: FakeExtractor, policy: DuplicatePolicy) -> Self {
        init_logging();
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(extractor);
        let history = HistoryStore::open(dir.path().join("history.json"), policy);
        let session = DownloadSession::new(
            extractor.clone(),
            CatalogBuilder::default(),
            history,
            SessionOptions::new(dir.path().join("downloads")),
        );
        Self {
            session,
            extractor,
            dir,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.path().join("history.json")
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("downloads").join(name)
    }

    /// Applies events until the current worker's terminal event
    pub async fn run_to_terminal(&mut self) -> Vec<ProgressEvent> {
        run_to_terminal(&mut self.session).await
    }

    /// Fetches `url` and waits for the catalog
    pub async fn discover(&mut self, url: &str) {
        self.session.fetch(url).unwrap();
        let events = self.run_to_terminal().await;
        assert!(
            matches!(events.last(), Some(ProgressEvent::CatalogReady(_))),
            "discovery did not produce a catalog: {:?}",
            events
        );
    }
}

pub async fn run_to_terminal(session: &mut DownloadSession) -> Vec<ProgressEvent> {
    tokio::time::timeout(Duration::from_secs(5), async {
        let mut events = Vec::new();
        loop {
            let event = session.next_event().await;
            let done = event.is_terminal();
            events.push(event);
            if done {
                return events;
            }
        }
    })
    .await
    .expect("worker did not finish")
}

/// Yields until `condition` holds
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}

pub fn progress_fractions(events: &[ProgressEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::DownloadProgress { fraction, .. } => Some(*fraction),
            _ => None,
        })
        .collect()
}

pub fn history_urls(path: &Path) -> Vec<String> {
    HistoryStore::load(path).into_iter().map(|e| e.url).collect()
}
