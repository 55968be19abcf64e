//! Resolve command-line paths into documents to load.
//!
//! Files are taken as given. Directories are walked and filtered with the
//! `[sources]` include/exclude globs, relative to the directory.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SourcesConfig;
use crate::extract::detect_content_type;

/// A document on disk, ready for [`Workspace::load`](crate::workspace::Workspace::load).
#[derive(Debug, Clone)]
pub struct DocumentSource {
    /// Display name; not unique and never used as a key.
    pub name: String,
    pub path: PathBuf,
    /// `None` when the format is not recognised; loading then fails for
    /// this document only.
    pub content_type: Option<&'static str>,
}

impl DocumentSource {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path: path.to_path_buf(),
            content_type: sniff(path),
        }
    }
}

fn sniff(path: &Path) -> Option<&'static str> {
    let mut head = [0u8; 8];
    let n = std::fs::File::open(path)
        .and_then(|mut f| f.read(&mut head))
        .unwrap_or(0);
    detect_content_type(path, &head[..n])
}

/// Expand `paths` into document sources, files first-come, directories
/// walked in sorted order.
pub fn collect_sources(paths: &[PathBuf], config: &SourcesConfig) -> Result<Vec<DocumentSource>> {
    let include_set = build_globset(&config.include_globs)?;
    let mut default_excludes = vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut sources = Vec::new();
    for path in paths {
        if path.is_file() {
            sources.push(DocumentSource::from_path(path));
            continue;
        }
        if !path.is_dir() {
            bail!("No such file or directory: {}", path.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path).follow_links(config.follow_symlinks) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = entry.path();
            let relative = file.strip_prefix(path).unwrap_or(file);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            found.push(DocumentSource::from_path(file));
        }
        found.sort_by(|a, b| a.path.cmp(&b.path));
        sources.extend(found);
    }

    Ok(sources)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
