//! Per-document ownership of clause indexes and navigation state.
//!
//! A [`Workspace`] holds every open document behind an opaque
//! [`DocumentId`]. Each document owns exactly one [`ClauseIndex`] and one
//! [`NavigationState`]; nothing is shared between documents, so two uploads
//! that happen to carry the same file name never see each other's state.
//!
//! Loading is an explicit pipeline:
//!
//! ```text
//! begin_load ──▶ read + extract ──▶ scan ──▶ build index ──▶ publish
//!  (ticket)        (blocking pool)                         (generation check)
//! ```
//!
//! [`Workspace::begin_load`] bumps the document's generation and hands out a
//! [`LoadTicket`]. [`Workspace::publish`] only applies a result whose ticket
//! still matches the current generation: a document that was reloaded or
//! closed while a scan was in flight simply drops the stale result. A failed
//! load leaves the previous index and navigation state untouched. A
//! successful one swaps the whole index in one step and resets navigation to
//! Idle.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use clause_nav_core::scanner::scan;
use clause_nav_core::{
    ClauseIndex, CoordinateOrigin, Highlight, IndexEntry, MarkerRecord, NavError,
    NavigationState, PageText, ScrollTarget,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::Config;
use crate::extract::{extract_pages, ExtractError};
use crate::progress::{NoProgress, ScanProgressEvent, ScanProgressReporter};
use crate::sources::DocumentSource;

/// Opaque handle for an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),
    #[error(transparent)]
    Navigation(#[from] NavError),
}

/// Proof that a load was started for a given document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: DocumentId,
    pub generation: u64,
}

/// Result of a finished load, ready to publish.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub index: ClauseIndex,
    pub pages: Vec<PageText>,
    pub fingerprint: String,
    pub content_type: String,
}

/// What [`Workspace::publish`] did with a load result.
#[derive(Debug)]
pub enum PublishOutcome {
    Applied { markers: usize, pages: usize },
    /// The document was reloaded or closed in the meantime.
    Stale,
    /// Extraction failed; the previous index is still in place.
    Failed(ExtractError),
}

/// Per-document load result from [`Workspace::load_all`].
#[derive(Debug)]
pub struct LoadReport {
    pub id: DocumentId,
    pub name: String,
    pub outcome: Result<PublishOutcome, WorkspaceError>,
}

/// Listing row for an open document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub name: String,
    pub generation: u64,
    pub markers: usize,
    pub content_type: Option<String>,
    pub fingerprint: Option<String>,
    pub last_error: Option<String>,
}

struct DocumentSlot {
    seq: u64,
    name: String,
    generation: u64,
    index: Arc<ClauseIndex>,
    navigation: NavigationState,
    /// Extracted page text, standing in for what a rendering surface shows.
    pages: Arc<Vec<PageText>>,
    fingerprint: Option<String>,
    content_type: Option<String>,
    last_error: Option<String>,
}

/// Load settings taken from [`Config`].
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    pub coordinate_origin: Option<CoordinateOrigin>,
    pub prefetch_concurrency: usize,
    pub max_file_bytes: u64,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl WorkspaceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            coordinate_origin: config.scan.coordinate_origin,
            prefetch_concurrency: config.extract.prefetch_concurrency,
            max_file_bytes: config.extract.max_file_bytes,
        }
    }
}

/// All open documents of one session.
pub struct Workspace {
    options: WorkspaceOptions,
    progress: Arc<dyn ScanProgressReporter>,
    slots: RwLock<HashMap<DocumentId, DocumentSlot>>,
    next_seq: AtomicU64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(WorkspaceOptions::default())
    }
}

impl Workspace {
    pub fn new(options: WorkspaceOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoProgress),
            slots: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ScanProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DocumentId, DocumentSlot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DocumentId, DocumentSlot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────

    /// Open a new, empty document view. `name` is for display only.
    pub fn open(&self, name: impl Into<String>) -> DocumentId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = DocumentId::new();
        self.write().insert(
            id,
            DocumentSlot {
                seq,
                name: name.into(),
                generation: 0,
                index: Arc::new(ClauseIndex::default()),
                navigation: NavigationState::default(),
                pages: Arc::new(Vec::new()),
                fingerprint: None,
                content_type: None,
                last_error: None,
            },
        );
        id
    }

    /// Close a document, dropping its index and navigation state together.
    /// Any load still in flight for it is discarded when it finishes.
    pub fn close(&self, id: DocumentId) -> Result<(), WorkspaceError> {
        self.write()
            .remove(&id)
            .map(|_| ())
            .ok_or(WorkspaceError::UnknownDocument(id))
    }

    /// Start a (re)load: bumps the generation so older in-flight loads go stale.
    pub fn begin_load(&self, id: DocumentId) -> Result<LoadTicket, WorkspaceError> {
        let mut slots = self.write();
        let slot = slots
            .get_mut(&id)
            .ok_or(WorkspaceError::UnknownDocument(id))?;
        slot.generation += 1;
        Ok(LoadTicket {
            id,
            generation: slot.generation,
        })
    }

    /// Apply a finished load if its ticket is still current.
    pub fn publish(
        &self,
        ticket: LoadTicket,
        result: Result<LoadedDocument, ExtractError>,
    ) -> PublishOutcome {
        let mut slots = self.write();
        let slot = match slots.get_mut(&ticket.id) {
            Some(slot) if slot.generation == ticket.generation => slot,
            _ => {
                tracing::debug!(document = %ticket.id, generation = ticket.generation, "discarding stale load");
                return PublishOutcome::Stale;
            }
        };

        match result {
            Ok(loaded) => {
                let markers = loaded.index.len();
                let pages = loaded.pages.len();
                slot.index = Arc::new(loaded.index);
                slot.pages = Arc::new(loaded.pages);
                slot.fingerprint = Some(loaded.fingerprint);
                slot.content_type = Some(loaded.content_type);
                slot.last_error = None;
                slot.navigation.reset();
                tracing::info!(document = %ticket.id, name = %slot.name, markers, pages, "clause index published");
                PublishOutcome::Applied { markers, pages }
            }
            Err(error) => {
                tracing::warn!(document = %ticket.id, name = %slot.name, %error, "load failed, keeping previous index");
                slot.last_error = Some(error.to_string());
                PublishOutcome::Failed(error)
            }
        }
    }

    // ─── Loading ────────────────────────────────────────────────────────

    /// Load (or reload) `id` from in-memory bytes.
    pub async fn load_bytes(
        &self,
        id: DocumentId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<PublishOutcome, WorkspaceError> {
        let ticket = self.begin_load(id)?;
        let name = self.name_of(id)?;
        self.progress.report(ScanProgressEvent::Loading {
            document: name.clone(),
        });
        let result = self.build(bytes, content_type).await;
        let outcome = self.publish(ticket, result);
        self.report_outcome(&name, &outcome);
        Ok(outcome)
    }

    /// Load (or reload) `id` from a file on disk.
    pub async fn load(
        &self,
        id: DocumentId,
        source: &DocumentSource,
    ) -> Result<PublishOutcome, WorkspaceError> {
        let ticket = self.begin_load(id)?;
        let name = self.name_of(id)?;
        self.progress.report(ScanProgressEvent::Loading {
            document: name.clone(),
        });
        let result = match self.read_source(&source.path).await {
            Ok(bytes) => match source.content_type {
                Some(ct) => self.build(bytes, ct).await,
                None => Err(ExtractError::UnsupportedContentType(format!(
                    "unknown ({})",
                    source.path.display()
                ))),
            },
            Err(e) => Err(e),
        };
        let outcome = self.publish(ticket, result);
        self.report_outcome(&name, &outcome);
        Ok(outcome)
    }

    /// Open and load several documents concurrently. Reports come back in
    /// the order of `sources`; one document failing never affects another.
    pub async fn load_all(self: &Arc<Self>, sources: Vec<DocumentSource>) -> Vec<LoadReport> {
        let mut tasks = JoinSet::new();
        for (i, source) in sources.into_iter().enumerate() {
            let workspace = Arc::clone(self);
            tasks.spawn(async move {
                let id = workspace.open(source.name.clone());
                let outcome = workspace.load(id, &source).await;
                (
                    i,
                    LoadReport {
                        id,
                        name: source.name,
                        outcome,
                    },
                )
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "document load task panicked"),
            }
        }
        reports.sort_by_key(|(i, _)| *i);
        reports.into_iter().map(|(_, r)| r).collect()
    }

    async fn read_source(&self, path: &Path) -> Result<Vec<u8>, ExtractError> {
        let io_err = |source: std::io::Error| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
        if size > self.options.max_file_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.options.max_file_bytes,
            });
        }
        tokio::fs::read(path).await.map_err(io_err)
    }

    async fn build(&self, bytes: Vec<u8>, content_type: &str) -> Result<LoadedDocument, ExtractError> {
        let size = bytes.len() as u64;
        if size > self.options.max_file_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.options.max_file_bytes,
            });
        }
        let fingerprint = format!("{:x}", Sha256::digest(&bytes));
        let extracted =
            extract_pages(bytes, content_type, self.options.prefetch_concurrency).await?;
        let origin = self.options.coordinate_origin.unwrap_or(extracted.origin);
        let index = ClauseIndex::build_with_origin(scan(&extracted.pages), origin);
        Ok(LoadedDocument {
            index,
            pages: extracted.pages,
            fingerprint,
            content_type: content_type.to_string(),
        })
    }

    fn report_outcome(&self, name: &str, outcome: &PublishOutcome) {
        let event = match outcome {
            PublishOutcome::Applied { markers, pages } => ScanProgressEvent::Indexed {
                document: name.to_string(),
                pages: *pages,
                markers: *markers,
            },
            PublishOutcome::Stale => ScanProgressEvent::Discarded {
                document: name.to_string(),
            },
            PublishOutcome::Failed(error) => ScanProgressEvent::Failed {
                document: name.to_string(),
                error: error.to_string(),
            },
        };
        self.progress.report(event);
    }

    // ─── Queries ────────────────────────────────────────────────────────

    fn with_slot<T>(
        &self,
        id: DocumentId,
        f: impl FnOnce(&DocumentSlot) -> T,
    ) -> Result<T, WorkspaceError> {
        self.read()
            .get(&id)
            .map(f)
            .ok_or(WorkspaceError::UnknownDocument(id))
    }

    fn name_of(&self, id: DocumentId) -> Result<String, WorkspaceError> {
        self.with_slot(id, |slot| slot.name.clone())
    }

    /// The current index of a document. Cheap to clone and never mixes
    /// records from two loads.
    pub fn index(&self, id: DocumentId) -> Result<Arc<ClauseIndex>, WorkspaceError> {
        self.with_slot(id, |slot| Arc::clone(&slot.index))
    }

    /// Navigation list for a document.
    pub fn entries(&self, id: DocumentId) -> Result<Vec<IndexEntry>, WorkspaceError> {
        self.with_slot(id, |slot| slot.index.entries())
    }

    pub fn locate(&self, id: DocumentId, position: usize) -> Result<MarkerRecord, WorkspaceError> {
        let index = self.index(id)?;
        let record = index.locate(position)?;
        Ok(record.clone())
    }

    pub fn navigation(&self, id: DocumentId) -> Result<NavigationState, WorkspaceError> {
        self.with_slot(id, |slot| slot.navigation.clone())
    }

    /// Select a marker in one document view. Other documents are untouched,
    /// and on error this document's state is unchanged too.
    pub fn select(&self, id: DocumentId, position: usize) -> Result<ScrollTarget, WorkspaceError> {
        let mut slots = self.write();
        let slot = slots
            .get_mut(&id)
            .ok_or(WorkspaceError::UnknownDocument(id))?;
        let index = Arc::clone(&slot.index);
        Ok(slot.navigation.select(&index, position)?)
    }

    /// Spans to highlight on a rendered page of `id`.
    pub fn resolve_highlight(
        &self,
        id: DocumentId,
        page: u32,
        page_text: &str,
    ) -> Result<Option<Highlight>, WorkspaceError> {
        self.with_slot(id, |slot| slot.navigation.resolve_highlight(page, page_text))
    }

    /// Extracted text of a 1-based page, one line per run.
    pub fn page_text(&self, id: DocumentId, page: u32) -> Result<Option<String>, WorkspaceError> {
        self.with_slot(id, |slot| {
            slot.pages
                .iter()
                .find(|p| p.number == page)
                .map(PageText::plain_text)
        })
    }

    pub fn summary(&self, id: DocumentId) -> Result<DocumentSummary, WorkspaceError> {
        self.with_slot(id, |slot| summarize(id, slot))
    }

    /// All open documents in the order they were opened.
    pub fn documents(&self) -> Vec<DocumentSummary> {
        let slots = self.read();
        let mut rows: Vec<(u64, DocumentSummary)> = slots
            .iter()
            .map(|(id, slot)| (slot.seq, summarize(*id, slot)))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

fn summarize(id: DocumentId, slot: &DocumentSlot) -> DocumentSummary {
    DocumentSummary {
        id,
        name: slot.name.clone(),
        generation: slot.generation,
        markers: slot.index.len(),
        content_type: slot.content_type.clone(),
        fingerprint: slot.fingerprint.clone(),
        last_error: slot.last_error.clone(),
    }
}
