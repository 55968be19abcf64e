//! Scan progress reporting.
//!
//! Reports what `clnav` is doing while documents load: which document is
//! being extracted, how many markers it produced, and which loads failed or
//! were superseded. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;
use std::sync::Arc;

/// A single progress event for one document.
#[derive(Clone, Debug)]
pub enum ScanProgressEvent {
    /// Extraction started.
    Loading { document: String },
    /// Index built and published.
    Indexed {
        document: String,
        pages: usize,
        markers: usize,
    },
    /// Extraction failed; the document keeps its previous index.
    Failed { document: String, error: String },
    /// The document was reloaded or closed before this load finished.
    Discarded { document: String },
}

/// Reports scan progress. Implementations write to stderr (human or JSON).
pub trait ScanProgressReporter: Send + Sync {
    fn report(&self, event: ScanProgressEvent);
}

/// Human-friendly progress on stderr: "scan contract.pdf  indexed  12 markers on 30 pages".
pub struct StderrProgress;

impl ScanProgressReporter for StderrProgress {
    fn report(&self, event: ScanProgressEvent) {
        let line = match &event {
            ScanProgressEvent::Loading { document } => format!("scan {}  extracting...\n", document),
            ScanProgressEvent::Indexed {
                document,
                pages,
                markers,
            } => format!(
                "scan {}  indexed  {} on {}\n",
                document,
                plural(*markers, "marker"),
                plural(*pages, "page")
            ),
            ScanProgressEvent::Failed { document, error } => {
                format!("scan {}  failed  {}\n", document, error)
            }
            ScanProgressEvent::Discarded { document } => {
                format!("scan {}  superseded, result discarded\n", document)
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ScanProgressReporter for JsonProgress {
    fn report(&self, event: ScanProgressEvent) {
        let obj = match &event {
            ScanProgressEvent::Loading { document } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "extracting"
            }),
            ScanProgressEvent::Indexed {
                document,
                pages,
                markers,
            } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "indexed",
                "pages": pages,
                "markers": markers
            }),
            ScanProgressEvent::Failed { document, error } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "failed",
                "error": error
            }),
            ScanProgressEvent::Discarded { document } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "discarded"
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ScanProgressReporter for NoProgress {
    fn report(&self, _event: ScanProgressEvent) {}
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Arc<dyn ScanProgressReporter> {
        match self {
            ProgressMode::Off => Arc::new(NoProgress),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}
