//! RAG response generation.

use super::{ContextBuilder, ContextChunk};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{PlaybookError, Result};
use crate::openai::create_client;
use crate::vector_store::VectorStore;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Maximum chat turns kept in memory.
const MAX_HISTORY: usize = 20;

/// RAG engine for question answering over the transcript library.
pub struct RagEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    context_builder: ContextBuilder,
    prompts: Prompts,
    conversation_history: Vec<ChatCompletionRequestMessage>,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        model: &str,
        max_context_chunks: usize,
        min_score: f32,
    ) -> Self {
        let context_builder = ContextBuilder::new(vector_store, embedder)
            .with_max_chunks(max_context_chunks)
            .with_min_score(min_score);

        Self {
            client: create_client(),
            model: model.to_string(),
            context_builder,
            prompts: Prompts::default(),
            conversation_history: Vec::new(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Ask a single question and get a grounded response.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        info!("Processing question");

        let bundle = self.context_builder.build(question).await?;

        if bundle.is_empty() {
            return Ok(RagResponse {
                answer: "I couldn't find any relevant material in the transcript library for this question.".to_string(),
                sources: Vec::new(),
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), bundle.serialize());

        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.rag.system.clone())
                .build()
                .map_err(|e| PlaybookError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| PlaybookError::Rag(e.to_string()))?
                .into(),
        ];

        let answer = self.complete(messages).await?;
        debug!("Generated response with {} sources", bundle.chunks.len());

        Ok(RagResponse {
            answer,
            sources: bundle.chunks,
        })
    }

    /// Start or continue a chat session.
    #[instrument(skip(self), fields(message = %message))]
    pub async fn chat(&mut self, message: &str) -> Result<RagResponse> {
        let bundle = self.context_builder.build(message).await?;

        let user_content = if bundle.is_empty() {
            format!(
                "Question: {}\n\n(No relevant material found in the transcript library)",
                message
            )
        } else {
            format!(
                "Question: {}\n\nRelevant excerpts from the library:\n\n{}",
                message,
                bundle.serialize()
            )
        };

        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(user_content)
            .build()
            .map_err(|e| PlaybookError::Rag(e.to_string()))?;
        self.conversation_history.push(user_message.into());

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.rag.chat_system.clone())
                .build()
                .map_err(|e| PlaybookError::Rag(e.to_string()))?
                .into(),
        ];
        messages.extend(self.conversation_history.clone());

        let answer = self.complete(messages).await?;

        let assistant_message = ChatCompletionRequestAssistantMessageArgs::default()
            .content(answer.clone())
            .build()
            .map_err(|e| PlaybookError::Rag(e.to_string()))?;
        self.conversation_history.push(assistant_message.into());

        if self.conversation_history.len() > MAX_HISTORY {
            self.conversation_history = self.conversation_history
                [self.conversation_history.len() - MAX_HISTORY..]
                .to_vec();
        }

        Ok(RagResponse {
            answer,
            sources: bundle.chunks,
        })
    }

    /// Clear conversation history.
    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }

    async fn complete(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| PlaybookError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PlaybookError::OpenAI(format!("Failed to generate response: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| PlaybookError::Rag("Empty response from LLM".to_string()))
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} (score: {:.2})\n  {}",
                    source.video_title, source.score, source.source_url
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkKind;

    #[test]
    fn display_format_lists_sources() {
        let response = RagResponse {
            answer: "Raise your prices.".to_string(),
            sources: vec![ContextChunk {
                chunk_id: "c1".to_string(),
                video_id: "v1".to_string(),
                video_title: "Pricing Power".to_string(),
                source_url: "https://youtube.com/watch?v=v1".to_string(),
                content: "price on value".to_string(),
                score: 0.91,
                kind: ChunkKind::Recursive,
                parent_id: None,
            }],
        };

        let display = response.format_for_display();
        assert!(display.starts_with("Raise your prices."));
        assert!(display.contains("Pricing Power (score: 0.91)"));
    }
}
