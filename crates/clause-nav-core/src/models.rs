//! Core data models shared by the scanner, the index, and the navigator.
//!
//! These types describe the page text handed in by an extraction
//! collaborator and the marker records that flow out of the scanner.

use serde::{Deserialize, Serialize};

/// A positioned run of text on a page, as yielded by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// Vertical coordinate in the extractor's own units.
    pub y: f64,
}

impl TextRun {
    pub fn new(text: impl Into<String>, y: f64) -> Self {
        Self {
            text: text.into(),
            y,
        }
    }
}

/// The text content of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    pub runs: Vec<TextRun>,
}

impl PageText {
    pub fn new(number: u32, runs: Vec<TextRun>) -> Self {
        Self { number, runs }
    }

    /// Page text as a rendering surface would see it: one line per run.
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|run| run.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One detected structural marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    /// The numeric prefix exactly as it appears, e.g. `4.2.3`.
    pub label: String,
    /// 1-based page number; always `>= 1`.
    pub page: u32,
    /// Only meaningful for ordering markers within one page.
    pub vertical_position: f64,
    /// The full trimmed run the marker was taken from.
    pub source_text: String,
}

/// A row of the user-facing navigation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub position: usize,
    pub label: String,
    pub page: u32,
}

/// Character span within a page's text, in Unicode scalar offsets.
/// `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
