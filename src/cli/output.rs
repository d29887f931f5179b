use crate::catalog::Catalog;
use crate::download::HistoryEntry;
use crate::download::progress::progress_display;

/// Width titles are cut to in human-readable output
pub const TITLE_WIDTH: usize = 60;

/// Catalog as a table (human) or the full structure (JSON)
pub fn format_catalog(catalog: &Catalog, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(catalog).unwrap_or_else(|_| "{}".to_string());
    }

    let mut output = String::new();
    output.push_str(&format!("{}\n", catalog.source.title_display(TITLE_WIDTH)));
    output.push_str(&format!("{}\n\n", catalog.source.duration_display()));

    if catalog.is_empty() {
        output.push_str("No downloadable formats found.");
        return output;
    }

    output.push_str(&format!(
        "{:<10} {:<16} {:<10} {:<5} {:<6} {:<20} {:>12}\n",
        "ID", "TYPE", "QUALITY", "EXT", "FPS", "CODECS", "SIZE"
    ));
    let rows: Vec<String> = catalog
        .entries
        .iter()
        .map(|entry| {
            format!(
                "{:<10} {:<16} {:<10} {:<5} {:<6} {:<20} {:>12}",
                entry.format_id,
                entry.kind.label(),
                entry.tier.label(),
                entry.ext,
                entry.fps,
                entry.codecs,
                entry.size
            )
        })
        .collect();
    output.push_str(&rows.join("\n"));
    output
}

/// History entries in the order given (human or JSON)
pub fn format_history(entries: &[&HistoryEntry], json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string());
    }

    if entries.is_empty() {
        return "No download history.".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  [{}] {}\n    {}",
                entry.date.format("%Y-%m-%d %H:%M:%S"),
                entry.platform,
                crate::catalog::descriptor::truncate_display(&entry.title, TITLE_WIDTH),
                entry.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single status line, rewritten in place with `\r`
pub fn format_progress(fraction: f64, speed: Option<f64>) -> String {
    progress_display(fraction, speed)
}
