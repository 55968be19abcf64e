//! Per-document clause index.
//!
//! A [`ClauseIndex`] holds every [`MarkerRecord`] of one document in reading
//! order: page ascending, then vertical position in the direction given by
//! the extractor's [`CoordinateOrigin`]. Index position is therefore a proxy
//! for reading order, and the navigation list shown to users is simply the
//! index in order.
//!
//! The sort is stable: records that share a page and a coordinate keep the
//! order the scanner emitted them in.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::models::{IndexEntry, MarkerRecord};

/// Where the extractor's vertical axis starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordinateOrigin {
    /// Origin at the bottom of the page (PDF user space). Earlier content
    /// has a larger `y`, so within a page the index sorts `y` descending.
    #[default]
    BottomUp,
    /// Origin at the top of the page. Within a page the index sorts `y`
    /// ascending.
    TopDown,
}

impl CoordinateOrigin {
    fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            CoordinateOrigin::BottomUp => b.total_cmp(&a),
            CoordinateOrigin::TopDown => a.total_cmp(&b),
        }
    }
}

/// Ordered collection of all markers detected in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClauseIndex {
    records: Vec<MarkerRecord>,
    origin: CoordinateOrigin,
}

impl ClauseIndex {
    /// Build an index for a bottom-up coordinate system.
    pub fn build(records: Vec<MarkerRecord>) -> Self {
        Self::build_with_origin(records, CoordinateOrigin::BottomUp)
    }

    /// Build an index, ordering same-page markers according to `origin`.
    pub fn build_with_origin(mut records: Vec<MarkerRecord>, origin: CoordinateOrigin) -> Self {
        // `sort_by` is stable, ties keep scan order.
        records.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then_with(|| origin.compare(a.vertical_position, b.vertical_position))
        });
        Self { records, origin }
    }

    pub fn origin(&self) -> CoordinateOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MarkerRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    /// Record at `position`, or [`NavError::OutOfRange`].
    pub fn locate(&self, position: usize) -> Result<&MarkerRecord, NavError> {
        self.records.get(position).ok_or(NavError::OutOfRange {
            position,
            len: self.records.len(),
        })
    }

    /// The navigation list: label and page for every position.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.records
            .iter()
            .enumerate()
            .map(|(position, r)| IndexEntry {
                position,
                label: r.label.clone(),
                page: r.page,
            })
            .collect()
    }

    /// All positions carrying `label`, in index order.
    pub fn positions_of(&self, label: &str) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.label == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Records found on a 1-based `page`, in reading order.
    pub fn on_page(&self, page: u32) -> impl Iterator<Item = &MarkerRecord> {
        self.records.iter().filter(move |r| r.page == page)
    }

    /// Distinct pages that carry at least one marker, ascending.
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.records.iter().map(|r| r.page).collect();
        pages.dedup();
        pages
    }
}

impl<'a> IntoIterator for &'a ClauseIndex {
    type Item = &'a MarkerRecord;
    type IntoIter = std::slice::Iter<'a, MarkerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
