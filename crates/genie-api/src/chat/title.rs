//! Best-effort title summarization, run once after the first AI response.
//!
//! Nothing in here may fail the turn: every error path degrades to "no
//! title produced" with a log line.

use async_trait::async_trait;
use genie_llm::{ChatOptions, ChatRequest, Message, ModelFactory};
use genie_persist::PersistClient;
use genie_types::TITLE_PLACEHOLDERS;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

/// How much of the AI response feeds the summarizer.
const AI_TEXT_PREFIX: usize = 1000;

const TITLE_SYSTEM_PROMPT: &str = "You are a helpful assistant that generates \
short, concise titles for conversations based on the first interaction. The \
title should be 3-6 words long. Capture the main topic. Do not use quotes.";

#[async_trait]
pub trait TitleTask: Send + Sync {
    /// Produce and persist a title, or `None` when nothing should be
    /// emitted. Must never propagate failure.
    async fn generate(&self, thread_id: &str, user_text: &str, ai_text: &str) -> Option<String>;
}

pub struct LlmTitleTask {
    persist: Arc<PersistClient>,
    models: Arc<ModelFactory>,
    provider: String,
    model: String,
    temperature: f32,
}

impl LlmTitleTask {
    pub fn new(
        persist: Arc<PersistClient>,
        models: Arc<ModelFactory>,
        provider: String,
        model: String,
        temperature: f32,
    ) -> Self {
        Self { persist, models, provider, model, temperature }
    }

    async fn try_generate(
        &self,
        thread_id: &str,
        user_text: &str,
        ai_text: &str,
    ) -> anyhow::Result<Option<String>> {
        if user_text.is_empty() || ai_text.is_empty() {
            return Ok(None);
        }

        let object_id = match ObjectId::parse_str(thread_id) {
            Ok(oid) => oid,
            Err(_) => return Ok(None),
        };

        // Only threads still carrying a placeholder title get summarized.
        let thread = match self.persist.threads().get(object_id).await? {
            Some(thread) => thread,
            None => return Ok(None),
        };
        if !TITLE_PLACEHOLDERS.contains(&thread.title.as_str()) {
            return Ok(None);
        }

        let llm = self.models.create(&self.provider, &self.model)?;
        let request = ChatRequest::new(vec![
            Message::system(TITLE_SYSTEM_PROMPT),
            Message::human(format!(
                "User: {}\nAssistant: {}\n\nGenerate a title for this conversation.",
                user_text,
                truncate_chars(ai_text, AI_TEXT_PREFIX),
            )),
        ])
        .with_options(ChatOptions::new().temperature(self.temperature));

        let response = llm.chat(request).await?;
        let title = strip_surrounding_quotes(response.text().trim()).to_string();
        if title.is_empty() {
            return Ok(None);
        }

        // The placeholder check above may have raced with another turn;
        // the conditional update is what actually decides.
        if self.persist.threads().set_title_if_placeholder(object_id, &title).await? {
            Ok(Some(title))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl TitleTask for LlmTitleTask {
    async fn generate(&self, thread_id: &str, user_text: &str, ai_text: &str) -> Option<String> {
        match self.try_generate(thread_id, user_text, ai_text).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!("Failed to generate thread title: {:#}", e);
                None
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Strip one layer of surrounding double or single quotes.
fn strip_surrounding_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);
    let s = s.strip_prefix('\'').unwrap_or(s);
    s.strip_suffix('\'').unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_stripped_from_both_ends() {
        assert_eq!(strip_surrounding_quotes("\"Weather Chat\""), "Weather Chat");
        assert_eq!(strip_surrounding_quotes("'Weather Chat'"), "Weather Chat");
        assert_eq!(strip_surrounding_quotes("Weather Chat"), "Weather Chat");
        assert_eq!(strip_surrounding_quotes("\"Mixed'"), "Mixed");
    }

    #[test]
    fn ai_prefix_is_bounded() {
        let long = "y".repeat(5000);
        assert_eq!(truncate_chars(&long, AI_TEXT_PREFIX).len(), 1000);
        assert_eq!(truncate_chars("short", AI_TEXT_PREFIX), "short");
    }
}
