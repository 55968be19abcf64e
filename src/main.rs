//! # Clause Nav CLI (`clnav`)
//!
//! Index the clause markers of PDF and plain-text documents and navigate
//! them from the command line.
//!
//! ## Usage
//!
//! ```bash
//! clnav [--config ./clnav.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `clnav scan <paths..>` | Print the navigation list of every document |
//! | `clnav show <path> <position>` | Print one marker record |
//! | `clnav select <path> <position>` | Print the scroll target and highlight spans |
//! | `clnav export <path>` | Export the clause index as JSON |
//! | `clnav completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Index every PDF under ./contracts, concurrently
//! clnav scan ./contracts
//!
//! # Jump to the second marker of a policy
//! clnav select policy.pdf 1
//!
//! # Hand the markers and their text to another tool
//! clnav export policy.pdf --output out/policy.json
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use clause_nav::config::{self, Config};
use clause_nav::export;
use clause_nav::progress::ProgressMode;
use clause_nav::sources::collect_sources;
use clause_nav::workspace::{DocumentId, PublishOutcome, Workspace, WorkspaceOptions};

/// Clause Nav CLI: structural clause indexing and navigation for
/// paginated documents.
#[derive(Parser)]
#[command(
    name = "clnav",
    about = "Clause Nav: index and navigate numbered clauses in PDF and text documents",
    version,
    long_about = "Clause Nav extracts positioned text from each page of a document, detects \
    dotted numeric clause markers such as 1.1 or 4.2.3 at the start of lines, and builds a \
    reading-order index per document that can be listed, selected, highlighted, and exported."
)]
struct Cli {
    /// Path to a configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index documents and print their navigation lists.
    ///
    /// Directories are walked using the `[sources]` globs. Documents are
    /// loaded concurrently; a document that fails to extract is reported
    /// and the others still complete.
    Scan {
        /// Files or directories to scan.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the marker record at an index position.
    Show {
        /// Document to index.
        path: PathBuf,
        /// 0-based position in the navigation list.
        position: usize,
    },

    /// Select a marker: print the page to scroll to and the spans to highlight.
    Select {
        /// Document to index.
        path: PathBuf,
        /// 0-based position in the navigation list.
        position: usize,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Export a document's clause index, with source text, as JSON.
    Export {
        /// Document to index.
        path: PathBuf,

        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CLNAV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "clnav", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
    let workspace = Arc::new(
        Workspace::new(WorkspaceOptions::from_config(&cfg)).with_progress(progress.reporter()),
    );

    match cli.command {
        Commands::Scan { paths, json } => run_scan(&cfg, &workspace, &paths, json).await?,
        Commands::Show { path, position } => {
            let id = load_single(&cfg, &workspace, &path).await?;
            let record = workspace.locate(id, position)?;
            println!("--- Marker {} ---", position);
            println!("label:             {}", record.label);
            println!("page:              {}", record.page);
            println!("vertical_position: {}", record.vertical_position);
            println!("source_text:       {}", record.source_text);
        }
        Commands::Select {
            path,
            position,
            json,
        } => run_select(&cfg, &workspace, &path, position, json).await?,
        Commands::Export { path, output } => {
            let id = load_single(&cfg, &workspace, &path).await?;
            let data = export::export_document(&workspace, id)?;
            export::write_export(&data, output.as_deref())?;
        }
        Commands::Completions { .. } => unreachable!("handled before config loading"),
    }

    Ok(())
}

async fn run_scan(cfg: &Config, workspace: &Arc<Workspace>, paths: &[PathBuf], json: bool) -> Result<()> {
    let sources = collect_sources(paths, &cfg.sources)?;
    if sources.is_empty() {
        bail!("No documents found");
    }
    let reports = workspace.load_all(sources).await;

    let mut failures = 0usize;
    let mut rows = Vec::new();
    for report in &reports {
        let error = match &report.outcome {
            Ok(PublishOutcome::Applied { .. }) => None,
            Ok(PublishOutcome::Failed(e)) => Some(e.to_string()),
            Ok(PublishOutcome::Stale) => Some("load superseded".to_string()),
            Err(e) => Some(e.to_string()),
        };
        if error.is_some() {
            failures += 1;
        }
        let entries = workspace.entries(report.id).unwrap_or_default();

        if json {
            rows.push(serde_json::json!({
                "document": report.name,
                "id": report.id.to_string(),
                "markers": entries,
                "error": error,
            }));
            continue;
        }

        println!("== {} ({} markers)", report.name, entries.len());
        if let Some(e) = &error {
            println!("   error: {}", e);
        }
        for entry in &entries {
            println!("   [{:>3}] {:<12} page {}", entry.position, entry.label, entry.page);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    if failures > 0 {
        eprintln!("{} of {} documents failed", failures, reports.len());
        std::process::exit(1);
    }
    Ok(())
}

async fn run_select(
    cfg: &Config,
    workspace: &Workspace,
    path: &Path,
    position: usize,
    json: bool,
) -> Result<()> {
    let id = load_single(cfg, workspace, path).await?;
    let target = workspace.select(id, position)?;
    let surface_page = cfg.navigation.surface_page(target.page);
    let highlight = match workspace.page_text(id, target.page)? {
        Some(text) => workspace.resolve_highlight(id, target.page, &text)?,
        None => None,
    };

    if json {
        let out = serde_json::json!({
            "page": target.page,
            "scroll_to": surface_page,
            "page_base": cfg.navigation.page_base,
            "highlight_target": target.label,
            "spans": highlight.as_ref().map(|h| h.spans.clone()).unwrap_or_default(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("scroll_to:        {} (page {})", surface_page, target.page);
    println!("highlight_target: {}", target.label);
    match highlight {
        Some(h) => {
            for span in &h.spans {
                println!("span:             {}..{}", span.start, span.end);
            }
        }
        None => println!("span:             (no match on page)"),
    }
    Ok(())
}

/// Open and load exactly one document, failing on extraction errors.
async fn load_single(cfg: &Config, workspace: &Workspace, path: &Path) -> Result<DocumentId> {
    let mut sources = collect_sources(&[path.to_path_buf()], &cfg.sources)?;
    if sources.len() != 1 {
        bail!(
            "Expected a single document at {}, found {}",
            path.display(),
            sources.len()
        );
    }
    let source = sources.remove(0);
    let id = workspace.open(source.name.clone());
    match workspace.load(id, &source).await? {
        PublishOutcome::Applied { .. } => Ok(id),
        PublishOutcome::Failed(e) => {
            Err(e).with_context(|| format!("Failed to index {}", path.display()))
        }
        PublishOutcome::Stale => bail!("Load of {} was superseded", path.display()),
    }
}
