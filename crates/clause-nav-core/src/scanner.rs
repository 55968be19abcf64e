//! Structural marker scanner.
//!
//! Walks page text in page order and emits a [`MarkerRecord`] for every run
//! whose trimmed text *starts with* a dotted numeric label: one or more ASCII
//! digits followed by at least one `.digits` group (`1.1`, `4.2.3`).
//!
//! Rules:
//! - the label must sit at the very start of the trimmed run, so
//!   `see clause 1.1 above` never matches;
//! - a bare number (`5`, `1. Introduction`) never matches;
//! - only the leading label is captured, a run is never split;
//! - duplicate labels are all kept.
//!
//! The output is in raw scan order. Canonical ordering is applied by
//! [`ClauseIndex::build`](crate::index::ClauseIndex::build).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{MarkerRecord, PageText};

static MARKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]+(?:\.[0-9]+)+").expect("marker pattern is a valid regex")
});

/// Returns the marker label at the start of `text`, if any.
///
/// `text` is trimmed before matching.
pub fn marker_label(text: &str) -> Option<&str> {
    MARKER_PATTERN.find(text.trim()).map(|m| m.as_str())
}

/// Scan pages for structural markers, preserving page and run order.
///
/// Pages are 1-based; a page numbered 0 is skipped.
pub fn scan(pages: &[PageText]) -> Vec<MarkerRecord> {
    let mut records = Vec::new();

    for page in pages.iter().filter(|p| p.number >= 1) {
        for run in &page.runs {
            let trimmed = run.text.trim();
            if let Some(label) = marker_label(trimmed) {
                records.push(MarkerRecord {
                    label: label.to_string(),
                    page: page.number,
                    vertical_position: run.y,
                    source_text: trimmed.to_string(),
                });
            }
        }
    }

    records
}
