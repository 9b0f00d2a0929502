use crate::types::Message;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for chat-based LLM interactions.
///
/// Turn-time model calls are owned by the external graph engine; this client
/// exists for small local completions (title summarization and the like), so
/// only the non-streaming form is provided.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, options: ChatOptions::default() }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub raw: Value,
}

impl ChatResponse {
    /// Response text, empty when the model returned none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}
