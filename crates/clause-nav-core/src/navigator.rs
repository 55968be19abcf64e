//! Per-view navigation state.
//!
//! A [`NavigationState`] is either **Idle** (nothing selected) or
//! **Selected** (an index position and the label to highlight). It moves to
//! Selected through [`NavigationState::select`] and back to Idle through
//! [`NavigationState::reset`], which owners call whenever the document's
//! [`ClauseIndex`] is rebuilt since old positions no longer mean anything.
//!
//! Page numbers are 1-based everywhere in this crate. Rendering surfaces that
//! count pages from zero use [`ScrollTarget::page_index`].

use serde::Serialize;

use crate::error::NavError;
use crate::index::ClauseIndex;
use crate::models::Span;

/// Selection and highlight state for one open document view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub active_index: Option<usize>,
    pub highlight_target: Option<String>,
}

/// Where the rendering surface should scroll after a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollTarget {
    /// 1-based page number.
    pub page: u32,
    pub label: String,
}

impl ScrollTarget {
    /// 0-based page offset.
    pub fn page_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

/// Spans of a rendered page to paint for the current highlight target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub page: u32,
    pub target: String,
    pub spans: Vec<Span>,
}

impl NavigationState {
    pub fn is_idle(&self) -> bool {
        self.active_index.is_none() && self.highlight_target.is_none()
    }

    /// Return to Idle.
    pub fn reset(&mut self) {
        self.active_index = None;
        self.highlight_target = None;
    }

    /// Select the marker at `position` and request its label be highlighted.
    ///
    /// Both fields are replaced together. On error nothing changes.
    pub fn select(
        &mut self,
        index: &ClauseIndex,
        position: usize,
    ) -> Result<ScrollTarget, NavError> {
        let record = index.locate(position)?;
        self.active_index = Some(position);
        self.highlight_target = Some(record.label.clone());
        Ok(ScrollTarget {
            page: record.page,
            label: record.label.clone(),
        })
    }

    /// Find the spans of `page_text` to highlight for the current target.
    ///
    /// The page text is taken line by line. A line whose content (ignoring
    /// leading whitespace) equals or starts with the target contributes the
    /// span covering the target itself. Matching is case-sensitive and
    /// exact; a target directly followed by another digit does not match, so
    /// `2.1` never lights up `2.10`.
    ///
    /// Returns `None` when no target is set or nothing on this page matches.
    pub fn resolve_highlight(&self, page: u32, page_text: &str) -> Option<Highlight> {
        let target = self.highlight_target.as_deref()?;
        if target.is_empty() {
            return None;
        }
        let target_chars = target.chars().count();

        let mut spans = Vec::new();
        let mut line_start = 0usize;
        for line in page_text.split('\n') {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix(target) {
                if !rest.starts_with(|c: char| c.is_ascii_digit()) {
                    let leading = line.chars().count() - trimmed.chars().count();
                    let start = line_start + leading;
                    spans.push(Span {
                        start,
                        end: start + target_chars,
                    });
                }
            }
            line_start += line.chars().count() + 1;
        }

        if spans.is_empty() {
            None
        } else {
            Some(Highlight {
                page,
                target: target.to_string(),
                spans,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkerRecord;

    fn two_page_index() -> ClauseIndex {
        ClauseIndex::build(vec![
            MarkerRecord {
                label: "1.1".into(),
                page: 1,
                vertical_position: 700.0,
                source_text: "1.1 Scope".into(),
            },
            MarkerRecord {
                label: "2.1".into(),
                page: 2,
                vertical_position: 900.0,
                source_text: "2.1 Definitions".into(),
            },
        ])
    }

    #[test]
    fn select_sets_both_fields_and_returns_page() {
        let index = two_page_index();
        let mut nav = NavigationState::default();
        let target = nav.select(&index, 1).unwrap();
        assert_eq!(target.page, 2);
        assert_eq!(target.page_index(), 1);
        assert_eq!(nav.active_index, Some(1));
        assert_eq!(nav.highlight_target.as_deref(), Some("2.1"));

        let highlight = nav
            .resolve_highlight(2, "2.1 Definitions and Terms")
            .unwrap();
        assert_eq!(highlight.spans, vec![Span { start: 0, end: 3 }]);
    }

    #[test]
    fn out_of_range_leaves_state_unchanged() {
        let index = two_page_index();
        let mut nav = NavigationState::default();
        assert!(nav.select(&index, 5).is_err());
        assert!(nav.is_idle());

        nav.select(&index, 0).unwrap();
        let before = nav.clone();
        let err = nav.select(&index, 5).unwrap_err();
        assert_eq!(err, NavError::OutOfRange { position: 5, len: 2 });
        assert_eq!(nav, before);
    }

    #[test]
    fn select_is_idempotent() {
        let index = two_page_index();
        let mut nav = NavigationState::default();
        let first = nav.select(&index, 0).unwrap();
        let after_first = nav.clone();
        let second = nav.select(&index, 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(nav, after_first);
    }

    #[test]
    fn reset_returns_to_idle() {
        let index = two_page_index();
        let mut nav = NavigationState::default();
        nav.select(&index, 1).unwrap();
        assert!(!nav.is_idle());
        nav.reset();
        assert!(nav.is_idle());
    }

    #[test]
    fn no_target_means_no_highlight() {
        let nav = NavigationState::default();
        assert_eq!(nav.resolve_highlight(1, "1.1 Scope"), None);
    }

    #[test]
    fn highlight_ignores_embedded_and_longer_labels() {
        let nav = NavigationState {
            active_index: Some(0),
            highlight_target: Some("2.1".into()),
        };
        assert_eq!(nav.resolve_highlight(2, "see 2.1 above"), None);
        assert_eq!(nav.resolve_highlight(2, "2.10 Other"), None);
        assert_eq!(nav.resolve_highlight(2, "2.1.3 Nested"), Some(Highlight {
            page: 2,
            target: "2.1".into(),
            spans: vec![Span { start: 0, end: 3 }],
        }));
    }

    #[test]
    fn highlight_offsets_count_characters_across_lines() {
        let nav = NavigationState {
            active_index: Some(3),
            highlight_target: Some("4.2".into()),
        };
        let text = "Précis\n  4.2 Fees\nbody\n4.2";
        let highlight = nav.resolve_highlight(7, text).unwrap();
        // "Précis\n" is 7 chars, plus two spaces of indent.
        assert_eq!(
            highlight.spans,
            vec![Span { start: 9, end: 12 }, Span { start: 23, end: 26 }]
        );
        assert_eq!(highlight.page, 7);
    }

    #[test]
    fn highlight_is_case_sensitive_and_exact() {
        let nav = NavigationState {
            active_index: Some(0),
            highlight_target: Some("A.1".into()),
        };
        assert_eq!(nav.resolve_highlight(1, "a.1 lower"), None);
    }
}
