//! Raw format metadata as reported by the extractor.
//!
//! These types are read-only to the rest of the crate: the catalog builder
//! derives display entries from them but never mutates them.

use serde::{Deserialize, Serialize};

/// Codec value the extractor uses when a stream is absent
pub const CODEC_NONE: &str = "none";

/// One codec/container/resolution combination offered for a source URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Extractor identifier, unique within one discovery result
    pub format_id: String,
    /// Container extension (mp4, m4a, webm, ...)
    pub ext: String,
    #[serde(default = "default_codec")]
    pub vcodec: String,
    #[serde(default = "default_codec")]
    pub acodec: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    /// Exact size in bytes
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Extractor estimate in bytes
    #[serde(default)]
    pub filesize_approx: Option<u64>,
    /// Free-text note (e.g. "storyboard", "medium")
    #[serde(default)]
    pub format_note: String,
}

fn default_codec() -> String {
    CODEC_NONE.to_string()
}

impl FormatDescriptor {
    /// Creates a descriptor with no streams, no size and an empty note
    pub fn new(format_id: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            format_id: format_id.into(),
            ext: ext.into(),
            vcodec: default_codec(),
            acodec: default_codec(),
            height: None,
            fps: None,
            filesize: None,
            filesize_approx: None,
            format_note: String::new(),
        }
    }

    pub fn with_video(mut self, vcodec: impl Into<String>, height: Option<u32>) -> Self {
        self.vcodec = vcodec.into();
        self.height = height;
        self
    }

    pub fn with_audio(mut self, acodec: impl Into<String>) -> Self {
        self.acodec = acodec.into();
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_filesize(mut self, bytes: u64) -> Self {
        self.filesize = Some(bytes);
        self
    }

    pub fn with_filesize_approx(mut self, bytes: u64) -> Self {
        self.filesize_approx = Some(bytes);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.format_note = note.into();
        self
    }

    /// True when the video codec names a real stream
    pub fn has_video(&self) -> bool {
        codec_present(&self.vcodec)
    }

    /// True when the audio codec names a real stream
    pub fn has_audio(&self) -> bool {
        codec_present(&self.acodec)
    }

    /// Exact size, falling back to the extractor's estimate
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }
}

fn codec_present(codec: &str) -> bool {
    !codec.is_empty() && codec != CODEC_NONE
}

/// Source-level metadata returned alongside the format list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceInfo {
    pub title: String,
    /// Duration in seconds, when the extractor knows it
    pub duration: Option<f64>,
}

impl SourceInfo {
    pub fn new(title: impl Into<String>, duration: Option<f64>) -> Self {
        Self {
            title: title.into(),
            duration,
        }
    }

    /// Duration as `Duration: mm:ss`, or `Duration: Unknown`
    pub fn duration_display(&self) -> String {
        match self.duration {
            Some(secs) if secs > 0.0 => {
                let total = secs.round() as u64;
                format!("Duration: {:02}:{:02}", total / 60, total % 60)
            }
            _ => "Duration: Unknown".to_string(),
        }
    }

    /// Title cut to `max_chars` characters with a trailing ellipsis
    pub fn title_display(&self, max_chars: usize) -> String {
        truncate_display(&self.title, max_chars)
    }
}

/// Truncates on character boundaries, appending "..." when shortened
pub fn truncate_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}...", kept)
}
