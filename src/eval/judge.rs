//! LLM-backed answer generation and judging for the evaluation harness.
//!
//! The judge is an external collaborator: it is handed a question, a
//! generated answer, and the retrieved context, and returns scores. How it
//! arrives at them is its own business.

use crate::error::{PlaybookError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Generates an answer to an evaluation question from retrieved context.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String>;
}

/// Scores an answer for relevancy and faithfulness, each in [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct AnswerScores {
    /// How relevant the answer is to the question.
    pub relevancy: f64,
    /// How factually consistent the answer is with the retrieved context.
    pub faithfulness: f64,
}

/// Judges generated answers against their question and context.
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    async fn judge(&self, question: &str, answer: &str, context: &str) -> Result<AnswerScores>;
}

/// Chat-completion-backed answer generator.
pub struct LlmAnswerer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl LlmAnswerer {
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerer {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(
                    "You answer business questions using only the provided transcript excerpts. \
                     Be concise and ground every claim in the excerpts.",
                )
                .build()
                .map_err(|e| PlaybookError::Evaluation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Question: {}\n\nExcerpts:\n{}", question, context))
                .build()
                .map_err(|e| PlaybookError::Evaluation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(|e| PlaybookError::Evaluation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PlaybookError::OpenAI(format!("Answer generation failed: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| PlaybookError::Evaluation("Empty answer from LLM".to_string()))
    }
}

/// Chat-completion-backed judge returning JSON scores.
pub struct LlmJudge {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl LlmJudge {
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }

    /// Pull a JSON object out of a possibly chatty response.
    fn parse_scores(response: &str) -> Result<AnswerScores> {
        let json_start = response.find('{');
        let json_end = response.rfind('}');

        let json_str = match (json_start, json_end) {
            (Some(start), Some(end)) if end > start => &response[start..=end],
            _ => response,
        };

        #[derive(Deserialize)]
        struct RawScores {
            relevancy: f64,
            faithfulness: f64,
        }

        let raw: RawScores = serde_json::from_str(json_str).map_err(|e| {
            PlaybookError::Evaluation(format!(
                "failed to parse judge response: {}. Response was: {}",
                e,
                &response[..response.len().min(300)]
            ))
        })?;

        Ok(AnswerScores {
            relevancy: raw.relevancy.clamp(0.0, 1.0),
            faithfulness: raw.faithfulness.clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl AnswerJudge for LlmJudge {
    async fn judge(&self, question: &str, answer: &str, context: &str) -> Result<AnswerScores> {
        let prompt = format!(
            "Score this answer on two axes, each from 0.0 to 1.0:\n\
             - relevancy: how directly it answers the question\n\
             - faithfulness: how consistent it is with the context, with no \
               claims the context does not support\n\n\
             Question: {}\n\nContext:\n{}\n\nAnswer: {}\n\n\
             Respond with only a JSON object: {{\"relevancy\": <float>, \"faithfulness\": <float>}}",
            question, context, answer
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You are a strict evaluation judge. Respond with JSON only.")
                .build()
                .map_err(|e| PlaybookError::Evaluation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PlaybookError::Evaluation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(|e| PlaybookError::Evaluation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PlaybookError::OpenAI(format!("Judge call failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| PlaybookError::Evaluation("Empty judge response".to_string()))?;

        debug!("judge response: {}", &content[..content.len().min(200)]);
        Self::parse_scores(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json_scores() {
        let scores =
            LlmJudge::parse_scores(r#"{"relevancy": 0.8, "faithfulness": 0.9}"#).unwrap();
        assert!((scores.relevancy - 0.8).abs() < 1e-9);
        assert!((scores.faithfulness - 0.9).abs() < 1e-9);
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let response = "Here are the scores:\n```json\n{\"relevancy\": 1.0, \"faithfulness\": 0.5}\n```\nDone.";
        let scores = LlmJudge::parse_scores(response).unwrap();
        assert!((scores.relevancy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let scores =
            LlmJudge::parse_scores(r#"{"relevancy": 1.7, "faithfulness": -0.2}"#).unwrap();
        assert_eq!(scores.relevancy, 1.0);
        assert_eq!(scores.faithfulness, 0.0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(LlmJudge::parse_scores("no json here").is_err());
    }
}
