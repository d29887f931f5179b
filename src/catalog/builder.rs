//! Format Catalog Builder
//!
//! Turns one discovery result into an ordered, deduplicated, classified
//! catalog. Filtering is deterministic and preserves the extractor's order.

use super::descriptor::{FormatDescriptor, SourceInfo, CODEC_NONE};
use super::tier::QualityTier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Extensions kept when no configuration overrides them
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["mp4", "m4a", "webm"];

const MIB: f64 = 1024.0 * 1024.0;

/// Stream classification of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    VideoAndAudio,
    VideoOnly,
    AudioOnly,
}

impl StreamKind {
    pub fn classify(descriptor: &FormatDescriptor) -> Self {
        match (descriptor.has_video(), descriptor.has_audio()) {
            (true, true) => StreamKind::VideoAndAudio,
            (true, false) => StreamKind::VideoOnly,
            _ => StreamKind::AudioOnly,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamKind::VideoAndAudio => "Video + Audio",
            StreamKind::VideoOnly => "Video Only",
            StreamKind::AudioOnly => "Audio Only",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display-ready projection of one FormatDescriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identifier of the originating descriptor
    pub format_id: String,
    pub kind: StreamKind,
    pub tier: QualityTier,
    /// Size in MB with one decimal, or "Unknown"
    pub size: String,
    pub ext: String,
    pub height: Option<u32>,
    /// Frame rate, or "N/A"
    pub fps: String,
    /// `vcodec/acodec`, or the single present codec
    pub codecs: String,
}

impl CatalogEntry {
    fn from_descriptor(descriptor: &FormatDescriptor) -> Self {
        Self {
            format_id: descriptor.format_id.clone(),
            kind: StreamKind::classify(descriptor),
            tier: QualityTier::from_height(descriptor.height),
            size: size_display(descriptor.effective_size()),
            ext: descriptor.ext.clone(),
            height: descriptor.height,
            fps: descriptor
                .fps
                .map(|fps| format!("{}", fps))
                .unwrap_or_else(|| "N/A".to_string()),
            codecs: codec_summary(descriptor),
        }
    }
}

/// Bytes to mebibytes with one decimal place
pub fn size_display(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) => format!("{:.1} MB", bytes as f64 / MIB),
        None => "Unknown".to_string(),
    }
}

fn codec_summary(descriptor: &FormatDescriptor) -> String {
    match (descriptor.has_video(), descriptor.has_audio()) {
        (true, true) => format!("{}/{}", descriptor.vcodec, descriptor.acodec),
        (true, false) => descriptor.vcodec.clone(),
        (false, true) => descriptor.acodec.clone(),
        (false, false) => CODEC_NONE.to_string(),
    }
}

/// Result of one successful discovery, rebuilt in full every time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub source: SourceInfo,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// True when nothing survived filtering ("no formats" state, not a failure)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, format_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.format_id == format_id)
    }

    pub fn contains(&self, format_id: &str) -> bool {
        self.get(format_id).is_some()
    }
}

/// Builds catalogs under a configurable extension allow-list
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    allowed_extensions: HashSet<String>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS)
    }
}

impl CatalogBuilder {
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions.contains(&ext.to_ascii_lowercase())
    }

    /// Descriptors that survive filtering, in extractor order, first id wins
    pub fn filter<'a>(&self, formats: &'a [FormatDescriptor]) -> Vec<&'a FormatDescriptor> {
        let mut seen = HashSet::new();
        formats
            .iter()
            .filter(|f| self.allows_extension(&f.ext))
            .filter(|f| !is_non_playable(f))
            .filter(|f| seen.insert(f.format_id.as_str()))
            .collect()
    }

    pub fn build(&self, source: SourceInfo, formats: &[FormatDescriptor]) -> Catalog {
        let entries: Vec<CatalogEntry> = self
            .filter(formats)
            .into_iter()
            .map(CatalogEntry::from_descriptor)
            .collect();

        tracing::debug!(
            "Catalog built for '{}': {} of {} formats kept",
            source.title,
            entries.len(),
            formats.len()
        );

        Catalog { source, entries }
    }
}

/// Storyboards and image tracks cannot be played or muxed
fn is_non_playable(descriptor: &FormatDescriptor) -> bool {
    descriptor.vcodec == "images" || descriptor.format_note.to_lowercase().contains("storyboard")
}
