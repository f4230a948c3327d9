//! Evaluation dataset loading.

use crate::error::{PlaybookError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// A hand-curated evaluation dataset: questions with verified answers and
/// the chunks a good retriever should surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalDataset {
    pub questions: Vec<EvalQuestion>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One evaluation question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalQuestion {
    pub question: String,
    pub ground_truth: String,
    pub relevant_chunks: Vec<EvalChunk>,
}

/// A ground-truth chunk with its source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalChunk {
    pub text: String,
    pub video_id: String,
}

impl EvalDataset {
    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlaybookError::Evaluation(format!("failed to read {}: {}", path.display(), e))
        })?;

        let dataset: EvalDataset = serde_json::from_str(&content).map_err(|e| {
            PlaybookError::Evaluation(format!("failed to parse {}: {}", path.display(), e))
        })?;

        if dataset.questions.is_empty() {
            return Err(PlaybookError::Evaluation(
                "evaluation dataset contains no questions".to_string(),
            ));
        }

        info!(
            "Loaded {} evaluation questions from {}",
            dataset.questions.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// The distinct video IDs the dataset's ground-truth chunks come from.
    pub fn video_ids(&self) -> BTreeSet<String> {
        self.questions
            .iter()
            .flat_map(|q| q.relevant_chunks.iter().map(|c| c.video_id.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_parses_questions_and_video_ids() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "questions": [
                    {
                        "question": "How should I price my offer?",
                        "ground_truth": "Price on value, not cost.",
                        "relevant_chunks": [
                            {"text": "price on value", "video_id": "v1"},
                            {"text": "cost is irrelevant", "video_id": "v2"}
                        ]
                    }
                ],
                "metadata": {"curated_by": "team"}
            }"#,
        )
        .unwrap();

        let dataset = EvalDataset::load(file.path()).unwrap();
        assert_eq!(dataset.questions.len(), 1);

        let ids = dataset.video_ids();
        assert!(ids.contains("v1"));
        assert!(ids.contains("v2"));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"questions": []}"#).unwrap();
        assert!(EvalDataset::load(file.path()).is_err());
    }
}
