//! # Lorehound — semantic knowledge assistant
//!
//! Ingests text documents into an in-memory embedding store and answers
//! questions grounded in the most relevant chunks.
//!
//! Usage:
//!   lorehound ingest ./docs          # Embed documents into the knowledge base
//!   lorehound ask "what is ...?"     # Ingest configured dir, then answer
//!   lorehound search "query" -k 5    # Show raw retrieval hits
//!   lorehound status                 # Knowledge base + backend overview

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lorehound_agent::Assistant;
use lorehound_core::LorehoundConfig;

#[derive(Parser)]
#[command(name = "lorehound", version, about = "🔎 Lorehound — semantic knowledge assistant")]
struct Cli {
    /// Config file path (default: ~/.lorehound/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Embed documents from a directory into the knowledge base
    Ingest {
        /// Directory containing *.md / *.txt documents
        dir: String,
    },
    /// Answer a question grounded in the knowledge base
    Ask {
        query: String,
        /// Directory to ingest first (default: configured knowledge dir)
        #[arg(short, long)]
        dir: Option<String>,
    },
    /// Show raw retrieval hits without generating an answer
    Search {
        query: String,
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
        /// Directory to ingest first (default: configured knowledge dir)
        #[arg(short, long)]
        dir: Option<String>,
    },
    /// Show knowledge base and backend status
    Status,
    /// Show recent question/answer history
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "lorehound=debug" } else { "lorehound=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => LorehoundConfig::load_from(std::path::Path::new(&expand_path(path)))?,
        None => LorehoundConfig::load()?,
    };
    let knowledge_dir = expand_path(&config.knowledge.dir);

    let assistant = Assistant::new(config)?;

    match cli.command {
        Command::Ingest { dir } => {
            let dir = expand_path(&dir);
            let added = assistant
                .knowledge()
                .ingest_dir(std::path::Path::new(&dir))
                .await?;
            let status = assistant.status().await;
            println!("📚 Ingested {added} new chunks ({} total)", status.chunk_count);
        }
        Command::Ask { query, dir } => {
            let dir = dir.map(|d| expand_path(&d)).unwrap_or(knowledge_dir);
            if std::path::Path::new(&dir).is_dir() {
                assistant
                    .knowledge()
                    .ingest_dir(std::path::Path::new(&dir))
                    .await?;
            }

            let response = assistant.ask(&query).await?;
            println!("\n{}\n", response.answer);
            println!("confidence: {:.0}%", response.confidence * 100.0);
            if !response.sources.is_empty() {
                println!("sources:");
                for s in &response.sources {
                    println!("  • {} (relevance {:.2})", s.source, s.relevance);
                }
            }
            if !response.suggested_actions.is_empty() {
                println!("suggested actions:");
                for a in &response.suggested_actions {
                    println!("  • {} — {}", a.title, a.description);
                }
            }
        }
        Command::Search { query, top_k, dir } => {
            let dir = dir.map(|d| expand_path(&d)).unwrap_or(knowledge_dir);
            if std::path::Path::new(&dir).is_dir() {
                assistant
                    .knowledge()
                    .ingest_dir(std::path::Path::new(&dir))
                    .await?;
            }

            let hits = assistant.knowledge().search_all(&query, top_k).await?;
            if hits.is_empty() {
                println!("No results.");
            }
            for hit in hits {
                println!("#{} [{:.4}] {} — {}", hit.rank, hit.score, hit.source, hit.content);
            }
        }
        Command::Status => {
            let status = assistant.status().await;
            println!("🔎 Lorehound v{}", env!("CARGO_PKG_VERSION"));
            println!("   Chunks:       {}", status.chunk_count);
            println!("   Sources:      {}", status.sources.len());
            println!(
                "   Dimension:    {}",
                status.dimension.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
            );
            println!("   Backend:      {}", status.backend);
            println!("   Interactions: {}", status.interactions);
        }
        Command::History { limit } => {
            let records = assistant.recent_interactions(limit);
            if records.is_empty() {
                println!("No interactions logged yet.");
            }
            for r in records {
                println!(
                    "[{}] {} → {} ({} results, {})",
                    r.created_at,
                    r.query,
                    r.answer.as_deref().unwrap_or("-"),
                    r.search_results_count,
                    r.model_used
                );
            }
        }
    }

    Ok(())
}
