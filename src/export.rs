//! Export a document's clause index as JSON.
//!
//! The export carries every marker with its source text so downstream
//! consumers (summarizers, decision services) can work from the index
//! without re-reading the document. Those consumers treat `source_text` as
//! an opaque string.

use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use clause_nav_core::CoordinateOrigin;
use serde::Serialize;
use std::path::Path;

use crate::workspace::{DocumentId, Workspace};

#[derive(Debug, Serialize)]
pub struct ExportData {
    pub document: String,
    pub fingerprint: Option<String>,
    pub content_type: Option<String>,
    pub generated_at: String,
    pub coordinate_origin: CoordinateOrigin,
    pub markers: Vec<ExportMarker>,
}

#[derive(Debug, Serialize)]
pub struct ExportMarker {
    pub position: usize,
    pub label: String,
    pub page: u32,
    pub vertical_position: f64,
    pub source_text: String,
}

/// Build the export payload for one loaded document.
pub fn export_document(workspace: &Workspace, id: DocumentId) -> Result<ExportData> {
    let summary = workspace.summary(id)?;
    if let Some(error) = summary.last_error {
        bail!("{}: {}", summary.name, error);
    }
    let index = workspace.index(id)?;

    let markers = index
        .iter()
        .enumerate()
        .map(|(position, r)| ExportMarker {
            position,
            label: r.label.clone(),
            page: r.page,
            vertical_position: r.vertical_position,
            source_text: r.source_text.clone(),
        })
        .collect();

    Ok(ExportData {
        document: summary.name,
        fingerprint: summary.fingerprint,
        content_type: summary.content_type,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        coordinate_origin: index.origin(),
        markers,
    })
}

/// Write the export to `output`, or to stdout when `None`.
pub fn write_export(data: &ExportData, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} markers from {} to {}",
                data.markers.len(),
                data.document,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
