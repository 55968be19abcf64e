//! # Clause Nav Core
//!
//! Pure logic for Clause Nav: the data model, the structural marker
//! scanner, the clause index, and per-view navigation state.
//!
//! This crate contains no tokio, filesystem I/O, or PDF parsing. Callers
//! hand it already-extracted page text (see [`models::PageText`]) and get
//! back an ordered [`index::ClauseIndex`] they can navigate with a
//! [`navigator::NavigationState`].
//!
//! ```
//! use clause_nav_core::models::{PageText, TextRun};
//! use clause_nav_core::index::ClauseIndex;
//! use clause_nav_core::navigator::NavigationState;
//! use clause_nav_core::scanner::scan;
//!
//! let pages = vec![PageText::new(1, vec![TextRun::new("1.1 Scope", 700.0)])];
//! let index = ClauseIndex::build(scan(&pages));
//! let mut nav = NavigationState::default();
//! let target = nav.select(&index, 0).unwrap();
//! assert_eq!(target.page, 1);
//! ```

pub mod error;
pub mod index;
pub mod models;
pub mod navigator;
pub mod scanner;

pub use error::NavError;
pub use index::{ClauseIndex, CoordinateOrigin};
pub use models::{IndexEntry, MarkerRecord, PageText, Span, TextRun};
pub use navigator::{Highlight, NavigationState, ScrollTarget};
