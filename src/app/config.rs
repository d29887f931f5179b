use crate::catalog::CatalogBuilder;
use crate::catalog::builder::DEFAULT_ALLOWED_EXTENSIONS;
use crate::download::DuplicatePolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration (saved to `<config_dir>/settings.toml`)
///
/// Every field has a default, so partial files load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub download: DownloadConfig,
    pub catalog: CatalogConfig,
    pub extractor: ExtractorConfig,
    pub history: HistoryConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Target directory, persisted across runs
    pub directory: PathBuf,
    /// Create the target directory when it does not exist
    pub auto_create_directory: bool,
    /// Container for merged video+audio downloads
    pub merge_output_format: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: crate::util::paths::resolve_default_download_directory(),
            auto_create_directory: true,
            merge_output_format: "mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub allowed_extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Executable name or path
    pub program: PathBuf,
    /// Passed to every invocation, before the URL
    pub extra_args: Vec<String>,
    /// Watchdog per extractor call; unset means wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Overrides `<config_dir>/history.json`; relative paths resolve against the config dir
    pub file: Option<PathBuf>,
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Progress drain period in milliseconds
    pub tick_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_ms: 250 }
    }
}

impl Config {
    /// Load settings.toml from the config directory, falling back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let config_path = crate::util::paths::get_app_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("Config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save settings.toml into the config directory
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = crate::util::paths::get_app_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;

        // Atomic write using temp file + rename
        let temp_path = path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &content).context("Failed to write temp config file")?;
        std::fs::rename(&temp_path, path).context("Failed to rename temp config file")?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Where the download history lives
    pub fn history_path(&self) -> anyhow::Result<PathBuf> {
        match &self.history.file {
            Some(file) => Ok(crate::util::paths::resolve_relative_to_config(file)),
            None => crate::util::paths::get_history_path(),
        }
    }

    pub fn catalog_builder(&self) -> CatalogBuilder {
        CatalogBuilder::new(&self.catalog.allowed_extensions)
    }
}
