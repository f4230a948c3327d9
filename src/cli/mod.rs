//! CLI module for Playbook.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Playbook - Transcript Chunking and RAG
///
/// A local-first CLI for chunking, indexing, and querying a library of
/// business coaching video transcripts.
#[derive(Parser, Debug)]
#[command(name = "playbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Playbook and create the default configuration
    Init,

    /// Check configuration, API access, and storage health
    Doctor,

    /// Import transcripts from a JSON export into the warehouse
    Import {
        /// Path to a JSON array of transcript records
        file: String,
    },

    /// Chunk, embed, and index a batch of transcripts
    Ingest {
        /// Maximum number of transcripts to process
        #[arg(short, long)]
        limit: Option<usize>,

        /// Re-process transcripts that are already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// Search for relevant transcript chunks
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,
    },

    /// Ask a question and get an answer grounded in the library
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of context chunks to include
        #[arg(short = 'c', long, default_value = "10")]
        max_chunks: usize,
    },

    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed transcripts
    List,

    /// Re-chunk an indexed transcript with the current settings
    Rechunk {
        /// Video ID to rechunk (use 'all' to rechunk everything)
        video_id: String,
    },

    /// Run the evaluation grid search and write a report
    Eval {
        /// Path to the evaluation dataset JSON
        #[arg(short, long)]
        dataset: Option<String>,

        /// Path for the markdown report
        #[arg(short, long)]
        report: Option<String>,

        /// Skip LLM answer generation and judging (retrieval metrics only)
        #[arg(long)]
        offline: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
