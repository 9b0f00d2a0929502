// OpenAI and Azure OpenAI clients (HTTP direct, no SDK)

use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use crate::types::{Content, ContentBlock, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: OPENAI_API_BASE.to_string(),
            model: model.into(),
        })
    }

    /// Override the API base, used for OpenAI-compatible gateways.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Convert a provider-neutral message to chat-completions wire form.
pub(crate) fn convert_message(msg: &Message) -> Value {
    let (role, content) = match msg {
        Message::System { content } => ("system", Some(content)),
        Message::Human { content } => ("user", Some(content)),
        Message::AI { content } => ("assistant", content.as_ref()),
    };

    let content_value = match content {
        Some(Content::Text(text)) => json!(text),
        Some(Content::Blocks(blocks)) => json!(blocks
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
                ContentBlock::ImageUrl { image_url } => json!({
                    "type": "image_url",
                    "image_url": { "url": image_url.url }
                }),
            })
            .collect::<Vec<_>>()),
        None => Value::Null,
    };

    json!({ "role": role, "content": content_value })
}

pub(crate) fn build_chat_payload(model: &str, request: &ChatRequest) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(convert_message).collect();

    let mut payload = json!({
        "model": model,
        "messages": messages,
    });

    let obj = payload.as_object_mut().expect("payload is an object");
    if let Some(temp) = request.options.temperature {
        obj.insert("temperature".to_string(), json!(temp));
    }
    if let Some(max_tokens) = request.options.max_tokens {
        obj.insert("max_tokens".to_string(), json!(max_tokens));
    }

    payload
}

/// Pull the assistant text out of a chat-completions response body.
pub(crate) fn extract_chat_content(body: &Value) -> Option<String> {
    let content = body.get("choices")?.get(0)?.get("message")?.get("content")?;
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => Some(
            blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(""),
        ),
        _ => None,
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = build_chat_payload(&self.model, &request);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        let body: Value = response.json().await.context("Invalid OpenAI response body")?;

        if !status.is_success() {
            anyhow::bail!("OpenAI returned {}: {}", status, body);
        }

        Ok(ChatResponse { content: extract_chat_content(&body), raw: body })
    }
}

/// Azure-hosted OpenAI deployment. Same wire format, different addressing and
/// auth header.
pub struct AzureOpenAIClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_version: String,
    model: String,
}

impl AzureOpenAIClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl ChatClient for AzureOpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = build_chat_payload(&self.model, &request);

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.model, self.api_version
        );

        let response = self
            .http_client
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("Azure OpenAI request failed")?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("Invalid Azure OpenAI response body")?;

        if !status.is_success() {
            anyhow::bail!("Azure OpenAI returned {}: {}", status, body);
        }

        Ok(ChatResponse { content: extract_chat_content(&body), raw: body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageUrl;

    #[test]
    fn convert_message_maps_roles() {
        let msg = convert_message(&Message::system("be brief"));
        assert_eq!(msg["role"], "system");
        assert_eq!(msg["content"], "be brief");

        let msg = convert_message(&Message::human("hi"));
        assert_eq!(msg["role"], "user");
    }

    #[test]
    fn convert_message_emits_multimodal_blocks() {
        let msg = Message::Human {
            content: Content::Blocks(vec![
                ContentBlock::Text { text: "look".into() },
                ContentBlock::ImageUrl {
                    image_url: ImageUrl { url: "data:image/png;base64,AAAA".into() },
                },
            ]),
        };
        let value = convert_message(&msg);
        let blocks = value["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(blocks[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn extract_chat_content_handles_string_and_blocks() {
        let body = serde_json::json!({
            "choices": [{ "message": { "content": "Hello" } }]
        });
        assert_eq!(extract_chat_content(&body).as_deref(), Some("Hello"));

        let body = serde_json::json!({
            "choices": [{ "message": { "content": [
                { "type": "text", "text": "Hel" },
                { "type": "text", "text": "lo" }
            ] } }]
        });
        assert_eq!(extract_chat_content(&body).as_deref(), Some("Hello"));
    }

    #[test]
    fn build_chat_payload_includes_options() {
        let request = ChatRequest::new(vec![Message::human("hi")])
            .with_options(crate::ChatOptions::new().temperature(0.5));
        let payload = build_chat_payload("gpt-4o", &request);
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["temperature"], 0.5);
        assert!(payload.get("max_tokens").is_none());
    }
}
