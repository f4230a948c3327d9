//! Configuration module for Playbook.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, EvalSettings, GeneralSettings, IndexingSettings,
    PromptSettings, RagSettings, Settings, SourceSettings, VectorStoreSettings,
};
