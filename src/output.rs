//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every image is its resolved identity (title and author) with the
//! relative path shown as secondary context via an indented `Source:` line.
//! This makes `check` readable as a content inventory while still letting
//! users trace each entry back to a file.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Collections
//! 001 catA (2 images)
//!     001 a red fox in snow · Ann
//!         Source: catA/img1.jpg
//!     002 img3 · Unknown
//!         Source: catA/sub/img3.png
//! 002 empty (0 images)
//! root (1 image)
//!     001 img2 · Unknown
//!         Source: img2.png
//!
//! Skipped
//!     catA/broken.jpg
//!         Error: cannot render thumbnail of ...
//!
//! Thumbnails: 1 cached, 2 generated, 1 failed (4 total)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStatus;
use crate::catalog::{ImageRecord, ScanReport};
use crate::config::ROOT_COLLECTION;
use crate::upload::UploadOutcome;

// ============================================================================
// Shared display helpers
// ============================================================================

const MAX_TITLE_CHARS: usize = 60;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn image_count(n: usize) -> String {
    if n == 1 {
        "1 image".to_string()
    } else {
        format!("{n} images")
    }
}

/// Format a collection header, numbered unless it is the root sentinel.
///
/// ```text
/// 001 catA (2 images)
/// root (1 image)
/// ```
fn collection_header(index: Option<usize>, name: &str, count: usize) -> String {
    match index {
        Some(i) => format!("{} {} ({})", format_index(i), name, image_count(count)),
        None => format!("{} ({})", name, image_count(count)),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_title(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn image_lines(records: &[&ImageRecord], depth: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in records.iter().enumerate() {
        lines.push(format!(
            "{}{} {} · {}",
            indent(depth),
            format_index(i + 1),
            truncate_title(&record.title, MAX_TITLE_CHARS),
            record.author
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(depth + 1),
            record.relative_path
        ));
    }
    lines
}

// ============================================================================
// Check
// ============================================================================

fn in_collection<'a>(records: &'a [ImageRecord], name: &str) -> Vec<&'a ImageRecord> {
    records.iter().filter(|r| r.collection == name).collect()
}

/// Inventory of a scan: collections with their images, skips, cache stats.
///
/// `collections` comes from the directory listing, so empty collections are
/// shown too. Records are grouped by their `collection` field.
pub fn format_check_output(report: &ScanReport, collections: &[String]) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Collections".to_string());
    for (i, name) in collections.iter().enumerate() {
        let records = in_collection(&report.records, name);
        lines.push(collection_header(Some(i + 1), name, records.len()));
        lines.extend(image_lines(&records, 1));
    }

    let root_records = in_collection(&report.records, ROOT_COLLECTION);
    if !root_records.is_empty() {
        lines.push(collection_header(None, ROOT_COLLECTION, root_records.len()));
        lines.extend(image_lines(&root_records, 1));
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &report.skipped {
            lines.push(format!("{}{}", indent(1), skipped.relative_path));
            lines.push(format!("{}Error: {}", indent(2), skipped.error));
        }
    }

    lines.push(String::new());
    lines.push(format!("Thumbnails: {}", report.stats));
    lines
}

pub fn print_check_output(report: &ScanReport, collections: &[String]) {
    for line in format_check_output(report, collections) {
        println!("{}", line);
    }
}

// ============================================================================
// Single-item commands
// ============================================================================

pub fn format_thumbnail_status(relative_path: &str, status: CacheStatus) -> String {
    match status {
        CacheStatus::Cached => format!("{relative_path}: cached"),
        CacheStatus::Generated => format!("{relative_path}: generated"),
    }
}

pub fn format_upload_outcome(outcome: &UploadOutcome) -> Vec<String> {
    vec![
        format!("Stored {}", outcome.relative_path),
        format!("{}Collection: {}", indent(1), outcome.collection),
        format!("{}File: {}", indent(1), outcome.file_name),
    ]
}

pub fn print_upload_outcome(outcome: &UploadOutcome) {
    for line in format_upload_outcome(outcome) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, ThumbnailError};
    use crate::catalog::SkippedImage;

    fn record(relative_path: &str, title: &str, author: &str) -> ImageRecord {
        ImageRecord {
            url: format!("/images/{relative_path}"),
            thumbnail_url: format!("/thumbnails/{relative_path}"),
            title: title.into(),
            author: author.into(),
            file_name: relative_path.rsplit('/').next().unwrap().into(),
            collection: crate::catalog::collection_of(relative_path).into(),
            relative_path: relative_path.into(),
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn collection_header_forms() {
        assert_eq!(collection_header(Some(1), "catA", 5), "001 catA (5 images)");
        assert_eq!(collection_header(None, "root", 1), "root (1 image)");
        assert_eq!(collection_header(Some(3), "empty", 0), "003 empty (0 images)");
    }

    #[test]
    fn truncate_title_is_char_safe() {
        assert_eq!(truncate_title("short", 10), "short");
        assert_eq!(truncate_title("exactly", 7), "exactly");
        assert_eq!(truncate_title("ééééé", 3), "ééé...");
    }

    // =========================================================================
    // Check output
    // =========================================================================

    #[test]
    fn check_output_groups_by_collection() {
        let report = ScanReport {
            records: vec![
                record("catA/img1.jpg", "a red fox in snow", "Ann"),
                record("img2.png", "img2", "Unknown"),
            ],
            skipped: vec![],
            stats: CacheStats {
                cached: 0,
                generated: 2,
                failed: 0,
            },
        };
        let lines = format_check_output(&report, &["catA".to_string(), "empty".to_string()]);
        assert_eq!(
            lines,
            vec![
                "Collections",
                "001 catA (1 image)",
                "    001 a red fox in snow · Ann",
                "        Source: catA/img1.jpg",
                "002 empty (0 images)",
                "root (1 image)",
                "    001 img2 · Unknown",
                "        Source: img2.png",
                "",
                "Thumbnails: 0 cached, 2 generated (2 total)",
            ]
        );
    }

    #[test]
    fn check_output_lists_skipped() {
        let report = ScanReport {
            records: vec![],
            skipped: vec![SkippedImage {
                relative_path: "catA/bad.jpg".into(),
                error: ThumbnailError::InvalidPath("catA/bad.jpg".into()),
            }],
            stats: CacheStats {
                cached: 0,
                generated: 0,
                failed: 1,
            },
        };
        let lines = format_check_output(&report, &["catA".to_string()]);
        assert!(lines.contains(&"Skipped".to_string()));
        assert!(lines.contains(&"    catA/bad.jpg".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("        Error: ")));
        assert_eq!(
            lines.last().unwrap(),
            "Thumbnails: 0 cached, 0 generated, 1 failed (1 total)"
        );
    }

    #[test]
    fn check_output_empty_tree() {
        let lines = format_check_output(&ScanReport::default(), &[]);
        assert_eq!(
            lines,
            vec!["Collections", "", "Thumbnails: 0 cached, 0 generated (0 total)"]
        );
    }

    // =========================================================================
    // Single-item output
    // =========================================================================

    #[test]
    fn thumbnail_status_line() {
        assert_eq!(
            format_thumbnail_status("catA/img1.jpg", CacheStatus::Cached),
            "catA/img1.jpg: cached"
        );
        assert_eq!(
            format_thumbnail_status("img2.png", CacheStatus::Generated),
            "img2.png: generated"
        );
    }

    #[test]
    fn upload_outcome_lines() {
        let outcome = UploadOutcome {
            file_name: "beach_1.jpg".into(),
            collection: "Summer_Trip".into(),
            relative_path: "Summer_Trip/beach_1.jpg".into(),
        };
        assert_eq!(
            format_upload_outcome(&outcome),
            vec![
                "Stored Summer_Trip/beach_1.jpg",
                "    Collection: Summer_Trip",
                "    File: beach_1.jpg",
            ]
        );
    }
}
