//! Playbook - Transcript Chunking and RAG
//!
//! A local-first CLI tool for turning long-form business coaching video
//! transcripts into a searchable, citable knowledge base.
//!
//! # Overview
//!
//! Playbook allows you to:
//! - Import enriched video transcripts from a warehouse or JSON export
//! - Chunk them adaptively: recursive splitting, strict size enforcement,
//!   optional semantic refinement and parent/child hierarchy
//! - Embed and index the chunks in a local vector store
//! - Search and ask questions grounded in the retrieved chunks
//! - Evaluate retrieval and answer quality over a curated question set
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `tokenizer` - Token counting, the unit of all size budgets
//! - `transcript` - Transcript sources (warehouse, JSON file)
//! - `chunking` - The adaptive chunking pipeline
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `rag` - Retrieval and grounded answering
//! - `orchestrator` - Batch pipeline coordination
//! - `eval` - Evaluation harness and grid search
//!
//! # Example
//!
//! ```rust,no_run
//! use playbook::config::Settings;
//! use playbook::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.index_batch(None, false).await?;
//!     println!(
//!         "Indexed {} chunks ({} dropped)",
//!         report.chunks_indexed, report.chunks_dropped
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod tokenizer;
pub mod transcript;
pub mod vector_store;

pub use error::{PlaybookError, Result};
