//! # Project Recall CLI (`recall`)
//!
//! The `recall` binary drives the pipeline: ingest project documents into
//! the search index, ask a new requirement against the indexed history, and
//! report storage status.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall ingest <file>` | Store, chunk, embed, and index a document |
//! | `recall ask "<requirement>"` | Retrieve similar history and generate an analysis |
//! | `recall status` | Show the stored-document count |

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use project_recall::analyze::Analyzer;
use project_recall::config;
use project_recall::context::build_context;
use project_recall::ingest::ingest_document;
use project_recall::models::DocumentLabels;
use project_recall::retrieve::Retriever;
use project_recall::services::Services;

/// Project Recall — retrieval-augmented analysis of development
/// requirements against indexed historical project documents.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "Project Recall — index project documents and analyze new requirements against them",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./recall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest a document: store the upload, extract text, chunk, embed,
    /// and upsert into the search index.
    Ingest {
        /// Path to the document to ingest.
        file: PathBuf,

        /// Project type label (e.g. `Billing`).
        #[arg(long)]
        project_type: Option<String>,

        /// Technology label (e.g. `Java`).
        #[arg(long)]
        technology: Option<String>,

        /// Department label (e.g. `DEV`).
        #[arg(long)]
        department: Option<String>,
    },

    /// Analyze a new requirement against indexed history.
    ///
    /// Retrieves the most similar historical passages, renders them into a
    /// bounded context, and asks the chat model for a grounded analysis.
    Ask {
        /// The requirement description.
        requirement: String,

        /// Short title mixed into the search query.
        #[arg(long)]
        title: Option<String>,

        /// Print the retrieved results before the analysis.
        #[arg(long)]
        show_sources: bool,
    },

    /// Show the number of stored documents.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let services = Services::from_config(cfg)?;

    match cli.command {
        Commands::Ingest {
            file,
            project_type,
            technology,
            department,
        } => {
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
                .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", file.display()))?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;

            let labels = DocumentLabels {
                project_type,
                technology,
                department,
            };

            let summary = ingest_document(&services, &filename, &bytes, &labels).await?;
            println!(
                "Indexed {}: {} of {} chunks ({} skipped)",
                filename, summary.chunks_indexed, summary.chunks_total, summary.chunks_skipped
            );
        }

        Commands::Ask {
            requirement,
            title,
            show_sources,
        } => {
            let query = match &title {
                Some(title) => format!("{} {}", title, requirement),
                None => requirement.clone(),
            };

            let retriever = Retriever::new(
                services.embedder.clone(),
                services.index.clone(),
                services.config.retrieval.top_k,
            );
            let results = retriever.search_similar(&query).await?;

            if show_sources {
                for (i, r) in results.iter().enumerate() {
                    println!("[{}] {} (score {:.2})", i + 1, r.filename, r.score);
                }
                if !results.is_empty() {
                    println!();
                }
            }

            let context = build_context(
                &results,
                services.config.retrieval.max_rendered,
                services.config.retrieval.snippet_chars,
            );

            let analyzer = Analyzer::new(services.chat.clone(), &services.config.chat);
            let answer = analyzer.analyze(&requirement, &context).await;
            println!("{}", answer);
        }

        Commands::Status => {
            let count = services.blobs.count().await?;
            println!("Stored documents: {}", count);
        }
    }

    Ok(())
}
