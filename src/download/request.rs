use super::error::SessionError;
use crate::catalog::selector::{self, BEST_SELECTOR};
use crate::catalog::{Catalog, CatalogEntry};
use crate::extractor::DownloadJob;
use std::path::{Path, PathBuf};

/// A user's request to download one catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    pub directory: PathBuf,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, format_id: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            format_id: format_id.into(),
            directory: directory.into(),
        }
    }

    /// Checks the request against the current catalog and the filesystem
    pub fn validate<'a>(
        &self,
        catalog: Option<&'a Catalog>,
        create_directory: bool,
    ) -> Result<&'a CatalogEntry, SessionError> {
        validate_url(&self.url)?;
        let entry = catalog
            .and_then(|c| c.get(&self.format_id))
            .ok_or_else(|| SessionError::InvalidSelection(self.format_id.clone()))?;
        resolve_directory(&self.directory, create_directory)?;
        Ok(entry)
    }

    /// Builds the extractor job for a validated entry
    pub fn job(&self, entry: &CatalogEntry, fallback_merge: &str) -> DownloadJob {
        let merge_format = match entry.kind {
            crate::catalog::StreamKind::VideoOnly => Some(selector::merge_format(entry, fallback_merge)),
            _ => None,
        };
        DownloadJob {
            url: self.url.clone(),
            selector: selector::format_selector(entry),
            output_template: selector::output_template(&self.directory, entry),
            merge_format,
        }
    }
}

/// Job for a catalog-less download of the best single-file format
pub fn best_job(url: &str, directory: &Path) -> DownloadJob {
    DownloadJob {
        url: url.to_string(),
        selector: BEST_SELECTOR.to_string(),
        output_template: selector::default_output_template(directory),
        merge_format: None,
    }
}

pub fn validate_url(url: &str) -> Result<(), SessionError> {
    if url.trim().is_empty() {
        return Err(SessionError::EmptyUrl);
    }
    Ok(())
}

/// Ensures `directory` exists, creating it when allowed
pub fn resolve_directory(directory: &Path, create: bool) -> Result<(), SessionError> {
    if directory.is_dir() {
        return Ok(());
    }
    if !create {
        return Err(SessionError::Directory {
            path: directory.to_path_buf(),
            message: "directory does not exist".to_string(),
        });
    }
    std::fs::create_dir_all(directory).map_err(|e| SessionError::Directory {
        path: directory.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!("Created download directory {:?}", directory);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, FormatDescriptor, SourceInfo};
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        CatalogBuilder::default().build(
            SourceInfo::new("clip", None),
            &[
                FormatDescriptor::new("137", "mp4").with_video("avc1", Some(1080)),
                FormatDescriptor::new("140", "m4a").with_audio("mp4a"),
            ],
        )
    }

    #[test]
    fn test_validate_accepts_known_entry() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let request = DownloadRequest::new("https://x/v", "140", dir.path());

        let entry = request.validate(Some(&catalog), false).unwrap();
        assert_eq!(entry.format_id, "140");
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let request = DownloadRequest::new("  ", "140", dir.path());

        assert!(matches!(
            request.validate(Some(&catalog), false),
            Err(SessionError::EmptyUrl)
        ));
    }

    #[test]
    fn test_validate_rejects_stale_selection() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let request = DownloadRequest::new("https://x/v", "999", dir.path());

        assert!(matches!(
            request.validate(Some(&catalog), false),
            Err(SessionError::InvalidSelection(id)) if id == "999"
        ));
        assert!(matches!(
            request.validate(None, false),
            Err(SessionError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_directory_creation_policy() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("videos");

        assert!(matches!(
            resolve_directory(&target, false),
            Err(SessionError::Directory { .. })
        ));
        resolve_directory(&target, true).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_job_for_video_only_entry() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let request = DownloadRequest::new("https://x/v", "137", dir.path());
        let entry = request.validate(Some(&catalog), false).unwrap();

        let job = request.job(entry, "mp4");
        assert_eq!(job.selector, "137+bestaudio");
        assert_eq!(job.merge_format.as_deref(), Some("mp4"));
        assert!(job.output_template.ends_with("%(title)s_1080p.%(ext)s"));
    }

    #[test]
    fn test_job_for_audio_entry_has_no_merge() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let request = DownloadRequest::new("https://x/v", "140", dir.path());
        let entry = request.validate(Some(&catalog), false).unwrap();

        let job = request.job(entry, "mp4");
        assert_eq!(job.selector, "140");
        assert_eq!(job.merge_format, None);
    }
}
