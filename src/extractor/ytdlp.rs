//! Adapter for the `yt-dlp` command-line extractor.
//!
//! Discovery runs `yt-dlp -J` and maps the info JSON onto FormatDescriptors.
//! Downloads run with a machine-readable progress template and `--print`
//! markers so that progress, title and final path can be read from stdout.

use super::{
    Discovery, DownloadJob, DownloadOutcome, Extractor, ExtractorError, ProgressCallback,
    ProgressUpdate, TransferStatus,
};
use crate::catalog::descriptor::{FormatDescriptor, SourceInfo, CODEC_NONE};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

const PROGRESS_MARKER: &str = "__MG_PROGRESS__";
const TITLE_MARKER: &str = "__MG_TITLE__";
const FILE_MARKER: &str = "__MG_FILE__";

/// `[Merger] Merging formats into "path"`
static MERGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[Merger\] Merging formats into "(.+)"$"#).expect("valid regex"));

/// `[download] Destination: path`
static DESTINATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[download\] Destination: (.+)$").expect("valid regex"));

/// `[download] path has already been downloaded`
static ALREADY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\] (.+) has already been downloaded").expect("valid regex")
});

/// Drives a `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments appended to every invocation (cookies, proxy, ...)
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> ExtractorError {
        ExtractorError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    fn download_args(&self, job: &DownloadJob) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-simulate".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{} %(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s %(progress.speed)s",
                PROGRESS_MARKER
            ),
            "--print".to_string(),
            format!("before_dl:{} %(title)s", TITLE_MARKER),
            "--print".to_string(),
            format!("after_move:{} %(filepath)s", FILE_MARKER),
            "-f".to_string(),
            job.selector.clone(),
            "-o".to_string(),
            job.output_template.clone(),
        ];
        if let Some(ref merge) = job.merge_format {
            args.push("--merge-output-format".to_string());
            args.push(merge.clone());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(job.url.clone());
        args
    }
}

#[async_trait]
impl Extractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn list_formats(&self, url: &str) -> Result<Discovery, ExtractorError> {
        tracing::debug!("Running {:?} -J for {}", self.program, url);

        let output = self
            .command()
            .args(["-J", "--no-warnings", "--no-playlist"])
            .args(&self.extra_args)
            .arg(url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::failed(
                output.status.code(),
                last_error_line(&stderr),
            ));
        }

        parse_info_json(&output.stdout)
    }

    async fn download(
        &self,
        job: &DownloadJob,
        on_progress: ProgressCallback<'_>,
    ) -> Result<DownloadOutcome, ExtractorError> {
        let args = self.download_args(job);
        tracing::debug!("Running {:?} with {:?}", self.program, args);

        let mut child = self
            .command()
            .args(&args)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::InvalidOutput("stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::InvalidOutput("stderr not captured".to_string()))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut scan = OutputScan::default();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(update) = scan.observe(&line) {
                on_progress(update);
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(ExtractorError::failed(status.code(), last_error_line(&stderr)));
        }

        let path = scan.final_path.ok_or(ExtractorError::MissingOutput)?;
        Ok(DownloadOutcome {
            path,
            title: scan.title,
        })
    }
}

/// Accumulates what a download run printed on stdout
#[derive(Debug, Default)]
struct OutputScan {
    title: Option<String>,
    final_path: Option<PathBuf>,
}

impl OutputScan {
    fn observe(&mut self, line: &str) -> Option<ProgressUpdate> {
        let line = line.trim_end();
        if let Some(update) = parse_progress_line(line) {
            return Some(update);
        }
        if let Some(title) = line.strip_prefix(TITLE_MARKER) {
            self.title = Some(title.trim().to_string());
        } else if let Some(path) = line.strip_prefix(FILE_MARKER) {
            self.final_path = Some(PathBuf::from(path.trim()));
        } else if let Some(caps) = MERGER_RE
            .captures(line)
            .or_else(|| DESTINATION_RE.captures(line))
            .or_else(|| ALREADY_RE.captures(line))
        {
            // Fallback when after_move printing is unavailable; the marker wins
            if self.final_path.is_none() || line.starts_with("[Merger]") {
                self.final_path = Some(PathBuf::from(&caps[1]));
            }
        }
        None
    }
}

/// Parses one progress-template line; fields yt-dlp cannot fill print as `NA`
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.split_whitespace();

    let status = match fields.next()? {
        "downloading" => TransferStatus::Downloading,
        "finished" => TransferStatus::Finished,
        _ => return None,
    };
    let number = |field: Option<&str>| field.and_then(|f| f.parse::<f64>().ok());

    let downloaded = number(fields.next()).unwrap_or(0.0);
    let total = number(fields.next());
    let estimate = number(fields.next());
    let speed = number(fields.next());

    Some(ProgressUpdate {
        status,
        downloaded_bytes: downloaded.max(0.0) as u64,
        total_bytes: total.map(|t| t.max(0.0) as u64),
        total_bytes_estimate: estimate.map(|t| t.max(0.0) as u64),
        speed,
    })
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    fps: Option<f64>,
    #[serde(default)]
    filesize: Option<f64>,
    #[serde(default)]
    filesize_approx: Option<f64>,
    #[serde(default)]
    format_note: Option<String>,
}

impl From<RawFormat> for FormatDescriptor {
    fn from(raw: RawFormat) -> Self {
        let bytes = |v: Option<f64>| v.filter(|b| *b >= 0.0).map(|b| b as u64);
        FormatDescriptor {
            format_id: raw.format_id,
            ext: raw.ext.unwrap_or_default(),
            vcodec: raw.vcodec.unwrap_or_else(|| CODEC_NONE.to_string()),
            acodec: raw.acodec.unwrap_or_else(|| CODEC_NONE.to_string()),
            height: raw.height.filter(|h| *h >= 0.0).map(|h| h as u32),
            fps: raw.fps,
            filesize: bytes(raw.filesize),
            filesize_approx: bytes(raw.filesize_approx),
            format_note: raw.format_note.unwrap_or_default(),
        }
    }
}

/// Maps `yt-dlp -J` output to a discovery result
pub fn parse_info_json(bytes: &[u8]) -> Result<Discovery, ExtractorError> {
    let info: InfoJson = serde_json::from_slice(bytes)?;
    Ok(Discovery {
        source: SourceInfo::new(
            info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            info.duration,
        ),
        formats: info.formats.into_iter().map(FormatDescriptor::from).collect(),
    })
}

/// Last meaningful stderr line, which is where yt-dlp reports the cause
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_json() {
        let json = br#"{
            "title": "Sample",
            "duration": 212,
            "formats": [
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "images", "acodec": "none", "format_note": "storyboard"},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 3145728},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1", "height": 1080, "fps": 30, "filesize_approx": 52428800.7}
            ]
        }"#;

        let discovery = parse_info_json(json).unwrap();

        assert_eq!(discovery.source.title, "Sample");
        assert_eq!(discovery.source.duration, Some(212.0));
        assert_eq!(discovery.formats.len(), 3);
        assert_eq!(discovery.formats[1].filesize, Some(3_145_728));
        assert_eq!(discovery.formats[2].acodec, CODEC_NONE);
        assert_eq!(discovery.formats[2].height, Some(1080));
        assert_eq!(discovery.formats[2].filesize_approx, Some(52_428_800));
    }

    #[test]
    fn test_parse_info_json_rejects_garbage() {
        assert!(matches!(
            parse_info_json(b"not json"),
            Err(ExtractorError::Json(_))
        ));
    }

    #[test]
    fn test_parse_progress_line() {
        let line = format!("{} downloading 1024 4096 NA 512.5", PROGRESS_MARKER);
        let update = parse_progress_line(&line).unwrap();

        assert_eq!(update.status, TransferStatus::Downloading);
        assert_eq!(update.downloaded_bytes, 1024);
        assert_eq!(update.total_bytes, Some(4096));
        assert_eq!(update.total_bytes_estimate, None);
        assert_eq!(update.speed, Some(512.5));
    }

    #[test]
    fn test_parse_progress_line_ignores_other_output() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_line(&format!("{} error 0 NA NA NA", PROGRESS_MARKER)).is_none());
    }

    #[test]
    fn test_output_scan_markers() {
        let mut scan = OutputScan::default();
        scan.observe(&format!("{} My Video", TITLE_MARKER));
        scan.observe("[download] Destination: /tmp/My Video_1080p.f137.mp4");
        scan.observe("[Merger] Merging formats into \"/tmp/My Video_1080p.mp4\"");
        assert_eq!(scan.final_path, Some(PathBuf::from("/tmp/My Video_1080p.mp4")));

        scan.observe(&format!("{} /tmp/final.mp4", FILE_MARKER));
        assert_eq!(scan.title.as_deref(), Some("My Video"));
        assert_eq!(scan.final_path, Some(PathBuf::from("/tmp/final.mp4")));
    }

    #[test]
    fn test_download_args() {
        let ytdlp = YtDlp::new("yt-dlp").with_extra_args(vec!["--proxy".into(), "socks5://x".into()]);
        let job = DownloadJob {
            url: "https://example.com/v".to_string(),
            selector: "137+bestaudio".to_string(),
            output_template: "/dl/%(title)s_1080p.%(ext)s".to_string(),
            merge_format: Some("mp4".to_string()),
        };
        let args = ytdlp.download_args(&job);

        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "137+bestaudio");
        let merge = args.iter().position(|a| a == "--merge-output-format").unwrap();
        assert_eq!(args[merge + 1], "mp4");
        assert!(args.contains(&"--proxy".to_string()));
    }

    #[test]
    fn test_last_error_line() {
        let stderr = "WARNING: something\nERROR: Video unavailable\n\n";
        assert_eq!(last_error_line(stderr), "ERROR: Video unavailable");
        assert_eq!(last_error_line(""), "unknown error");
    }
}
