//! Configuration settings for Playbook.

use crate::error::{PlaybookError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub source: SourceSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub indexing: IndexingSettings,
    pub rag: RagSettings,
    pub eval: EvalSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.playbook".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcript source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Source provider (warehouse, file).
    pub provider: String,
    /// Transcript store path: SQLite database for the warehouse provider,
    /// JSON export for the file provider.
    pub warehouse_path: String,
    /// Minimum transcript length in characters; shorter rows are skipped.
    pub min_transcript_chars: usize,
    /// Maximum number of transcripts to fetch per batch.
    pub fetch_limit: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            provider: "warehouse".to_string(),
            warehouse_path: "~/.playbook/warehouse.db".to_string(),
            min_transcript_chars: 1000,
            fetch_limit: 50,
        }
    }
}

/// Adaptive chunking settings.
///
/// All sizes are in tokens of the configured tokenizer encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum tokens per chunk.
    pub max_chunk_size: usize,
    /// Minimum tokens per chunk; smaller survivors are dropped.
    pub min_chunk_size: usize,
    /// Token overlap between adjacent chunks.
    pub chunk_overlap: usize,
    /// Re-segment chunks at embedding-distance discontinuities.
    pub use_semantic_refinement: bool,
    /// Build parent chunks for expand-on-retrieval context.
    pub use_hierarchy: bool,
    /// Token window for parent chunks (exempt from max_chunk_size).
    pub parent_chunk_size: usize,
    /// Percentile of adjacent-segment embedding distances above which a
    /// semantic boundary is cut.
    pub breakpoint_percentile: f64,
    /// Tokenizer encoding used for all size budgets.
    pub encoding: String,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: 400,
            min_chunk_size: 150,
            chunk_overlap: 50,
            use_semantic_refinement: false,
            use_hierarchy: false,
            parent_chunk_size: 2000,
            breakpoint_percentile: 95.0,
            encoding: "cl100k_base".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.playbook/vectors.db".to_string(),
        }
    }
}

/// Batch indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Maximum transcripts processed concurrently.
    pub max_concurrent: usize,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Maximum number of context chunks to include.
    pub max_context_chunks: usize,
    /// Minimum similarity score for retrieved chunks.
    pub min_score: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_context_chunks: 10,
            min_score: 0.3,
        }
    }
}

/// Evaluation harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    /// Path to the evaluation dataset JSON.
    pub dataset_path: String,
    /// Path for the generated markdown report.
    pub report_path: String,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Model used by the LLM answer judge.
    pub judge_model: String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            dataset_path: "eval_dataset.json".to_string(),
            report_path: "eval_report.md".to_string(),
            top_k: 4,
            judge_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings that would make the pipeline misbehave.
    ///
    /// Chunking misconfiguration is fatal for the whole run and is rejected
    /// here, before any transcript is processed.
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.max_chunk_size == 0 {
            return Err(PlaybookError::Config(
                "chunking.max_chunk_size must be positive".to_string(),
            ));
        }
        if c.max_chunk_size < c.min_chunk_size {
            return Err(PlaybookError::Config(format!(
                "chunking.max_chunk_size ({}) must be >= min_chunk_size ({})",
                c.max_chunk_size, c.min_chunk_size
            )));
        }
        if c.chunk_overlap >= c.max_chunk_size {
            return Err(PlaybookError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than max_chunk_size ({})",
                c.chunk_overlap, c.max_chunk_size
            )));
        }
        if c.use_hierarchy && c.parent_chunk_size <= c.max_chunk_size {
            return Err(PlaybookError::Config(format!(
                "chunking.parent_chunk_size ({}) must exceed max_chunk_size ({})",
                c.parent_chunk_size, c.max_chunk_size
            )));
        }
        if !(0.0 < c.breakpoint_percentile && c.breakpoint_percentile <= 100.0) {
            return Err(PlaybookError::Config(format!(
                "chunking.breakpoint_percentile ({}) must be in (0, 100]",
                c.breakpoint_percentile
            )));
        }
        if self.indexing.max_concurrent == 0 {
            return Err(PlaybookError::Config(
                "indexing.max_concurrent must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PlaybookError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playbook")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite vector database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded transcript warehouse path.
    pub fn warehouse_path(&self) -> PathBuf {
        Self::expand_path(&self.source.warehouse_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn max_below_min_is_rejected() {
        let mut settings = Settings::default();
        settings.chunking.max_chunk_size = 100;
        settings.chunking.min_chunk_size = 150;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn overlap_must_be_below_max() {
        let mut settings = Settings::default();
        settings.chunking.chunk_overlap = 400;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn parent_window_must_exceed_max() {
        let mut settings = Settings::default();
        settings.chunking.use_hierarchy = true;
        settings.chunking.parent_chunk_size = 300;
        assert!(settings.validate().is_err());
    }
}
