//! # Clause Nav
//!
//! Structural clause indexing and navigation for paginated documents.
//!
//! Clause Nav extracts positioned text from each page of a document, detects
//! dotted numeric clause markers (`1.1`, `4.2.3`) at the start of lines,
//! builds a reading-order index per document, and answers "go to marker"
//! and "highlight marker" requests for a rendering surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Sources   │──▶│  Extract    │──▶│ Scan + Index │──▶│  Workspace  │
//! │ files/dirs │   │ lopdf/text  │   │   (core)     │   │ per-doc nav │
//! └────────────┘   └─────────────┘   └──────────────┘   └──────┬──────┘
//!                                                              │
//!                                          ┌───────────────────┤
//!                                          ▼                   ▼
//!                                     ┌──────────┐       ┌──────────┐
//!                                     │   CLI    │       │  Export  │
//!                                     │ (clnav)  │       │  (JSON)  │
//!                                     └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`sources`] | Resolve paths and directories into documents |
//! | [`extract`] | Per-page positioned text extraction |
//! | [`workspace`] | Per-document index and navigation ownership |
//! | [`export`] | JSON export of a document's clause index |
//! | [`progress`] | Scan progress on stderr |
//!
//! The scanner, index, and navigator live in the `clause-nav-core` crate;
//! its main types are re-exported here.

pub use clause_nav_core::{
    ClauseIndex, CoordinateOrigin, Highlight, IndexEntry, MarkerRecord, NavError,
    NavigationState, PageText, ScrollTarget, Span, TextRun,
};

pub mod config;
pub mod export;
pub mod extract;
pub mod progress;
pub mod sources;
pub mod workspace;
