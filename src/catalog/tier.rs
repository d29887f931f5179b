//! Quality tiers derived from frame height.
//!
//! All resolution bucketing in the crate goes through [`QualityTier::from_height`]
//! and [`TIER_TABLE`], so display labels and their ranking cannot drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display tier of a format, ordered from lowest to highest rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// No height reported
    AudioOnly,
    /// Below the SD threshold, labelled with the raw height
    Low(u32),
    Sd,
    Hd,
    FullHd,
    Qhd,
    Uhd4k,
}

/// Minimum height for each named tier, highest first
pub const TIER_TABLE: [(u32, QualityTier); 5] = [
    (2160, QualityTier::Uhd4k),
    (1440, QualityTier::Qhd),
    (1080, QualityTier::FullHd),
    (720, QualityTier::Hd),
    (480, QualityTier::Sd),
];

impl QualityTier {
    /// Maps a height to its tier; the highest matching threshold wins
    pub fn from_height(height: Option<u32>) -> Self {
        let Some(height) = height else {
            return QualityTier::AudioOnly;
        };
        TIER_TABLE
            .iter()
            .find(|(min, _)| height >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(QualityTier::Low(height))
    }

    pub fn label(&self) -> String {
        match self {
            QualityTier::AudioOnly => "Audio Only".to_string(),
            QualityTier::Low(height) => format!("{}p", height),
            QualityTier::Sd => "SD".to_string(),
            QualityTier::Hd => "HD".to_string(),
            QualityTier::FullHd => "Full HD".to_string(),
            QualityTier::Qhd => "2K/QHD".to_string(),
            QualityTier::Uhd4k => "4K".to_string(),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Resolution tag used in output file names (`1080p`, `audio`, ...)
pub fn resolution_tag(height: Option<u32>) -> String {
    let Some(height) = height else {
        return "audio".to_string();
    };
    TIER_TABLE
        .iter()
        .find(|(min, _)| height >= *min)
        .map(|(min, _)| format!("{}p", min))
        .unwrap_or_else(|| format!("{}p", height))
}
