//! Translation from a chosen catalog entry to what the extractor needs:
//! a format selector, an output template and an optional merge container.

use super::builder::{CatalogEntry, StreamKind};
use super::tier::resolution_tag;
use std::path::Path;

/// Selector used when downloading without a catalog
pub const BEST_SELECTOR: &str = "best";

/// Containers the extractor can merge into directly
const MERGEABLE_EXTENSIONS: [&str; 2] = ["mp4", "m4a"];

/// Video-only entries are paired with the best audio so the extractor can mux
pub fn format_selector(entry: &CatalogEntry) -> String {
    match entry.kind {
        StreamKind::VideoOnly => format!("{}+bestaudio", entry.format_id),
        _ => entry.format_id.clone(),
    }
}

/// `<dir>/%(title)s_<res>.%(ext)s`
pub fn output_template(directory: &Path, entry: &CatalogEntry) -> String {
    directory
        .join(format!("%(title)s_{}.%(ext)s", resolution_tag(entry.height)))
        .to_string_lossy()
        .into_owned()
}

/// `<dir>/%(title)s.%(ext)s`, used for quick downloads
pub fn default_output_template(directory: &Path) -> String {
    directory
        .join("%(title)s.%(ext)s")
        .to_string_lossy()
        .into_owned()
}

/// Merge container for the entry's download
pub fn merge_format(entry: &CatalogEntry, fallback: &str) -> String {
    if MERGEABLE_EXTENSIONS.contains(&entry.ext.as_str()) {
        entry.ext.clone()
    } else {
        fallback.to_string()
    }
}
