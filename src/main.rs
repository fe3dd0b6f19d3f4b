mod cli;
mod config;
mod curation;
mod engine;
mod error;
mod generation;
mod knowledge;
mod retrieval;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lore",
    version,
    about = "Local knowledge curation: TF-IDF retrieval, duplicate cleanup, staged intake"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the retrieval index, merging configured source files
    Reindex,
    /// Query the knowledge store
    Search {
        /// Query text
        query: String,
        /// Maximum number of results
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// List near-duplicate entry clusters
    Duplicates {
        /// Similarity threshold in (0, 1]
        #[arg(long)]
        threshold: Option<f64>,
        /// Emit JSON instead of a readable listing
        #[arg(long)]
        json: bool,
    },
    /// Remove entries by position (writes a backup first)
    Apply {
        /// Positions to remove, comma-separated
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        indices: Vec<usize>,
        /// Remove every duplicate-group member except the seed
        #[arg(long, conflicts_with = "indices")]
        all_but_first: bool,
        /// Similarity threshold for --all-but-first
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Manage the staging intake
    Staging {
        #[command(subcommand)]
        action: StagingAction,
    },
    /// Work with the session log
    Log {
        #[command(subcommand)]
        action: LogAction,
    },
    /// Import entries from JSON files
    Import {
        /// Files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask the generation service, grounded in retrieved entries
    Ask {
        /// The question
        prompt: String,
        /// Wait for the full response instead of streaming
        #[arg(long)]
        no_stream: bool,
        /// Skip retrieval and send the prompt as-is
        #[arg(long)]
        bare: bool,
    },
    /// Show corpus, staging, and session statistics
    Stats,
}

#[derive(Subcommand)]
enum StagingAction {
    /// Submit a candidate entry for review
    Submit {
        question: String,
        answer: String,
        /// Proposer identity to record
        #[arg(long)]
        source: Option<String>,
    },
    /// List pending items
    List,
    /// Approve a pending item into the store
    Approve { id: String },
    /// Reject a pending item
    Reject {
        id: String,
        /// Reason to record
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
enum LogAction {
    /// Append an entry
    Add {
        /// Speaker role
        #[arg(long, default_value = "user")]
        role: String,
        text: String,
    },
    /// Search entries
    Query {
        needle: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Trim to a token budget, evicting oldest entries first
    Trim {
        /// Budget in estimated tokens
        #[arg(long)]
        budget: Option<usize>,
    },
    /// Delete every entry
    Clear,
    /// Export as JSONL to another file
    Export { dest: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::LoreConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for command output.
    let filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Reindex => cli::reindex::reindex(&config)?,
        Command::Search { query, top_k } => cli::search::search(&config, &query, top_k)?,
        Command::Duplicates { threshold, json } => {
            cli::duplicates::duplicates(&config, threshold, json)?
        }
        Command::Apply {
            indices,
            all_but_first,
            threshold,
        } => cli::apply::apply(&config, &indices, all_but_first, threshold)?,
        Command::Staging { action } => match action {
            StagingAction::Submit {
                question,
                answer,
                source,
            } => cli::staging::submit(&config, &question, &answer, source.as_deref())?,
            StagingAction::List => cli::staging::list(&config)?,
            StagingAction::Approve { id } => cli::staging::approve(&config, &id)?,
            StagingAction::Reject { id, reason } => {
                cli::staging::reject(&config, &id, reason.as_deref())?
            }
        },
        Command::Log { action } => match action {
            LogAction::Add { role, text } => cli::log::add(&config, &role, &text)?,
            LogAction::Query { needle, limit } => cli::log::query(&config, &needle, limit)?,
            LogAction::Trim { budget } => cli::log::trim(&config, budget)?,
            LogAction::Clear => cli::log::clear(&config)?,
            LogAction::Export { dest } => cli::log::export(&config, &dest)?,
        },
        Command::Import { files } => cli::import::import(&config, &files)?,
        Command::Ask {
            prompt,
            no_stream,
            bare,
        } => cli::ask::ask(&config, &prompt, no_stream, bare).await?,
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
