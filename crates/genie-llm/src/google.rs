// Google Gemini client (generateContent REST API)

use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use crate::types::{Content, ContentBlock, Message};
use anyhow::{Context, Result};
use serde_json::{json, Value};

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GoogleClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: GOOGLE_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into its parts.
fn parse_data_uri(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (mime, data) = rest.split_once(";base64,")?;
    Some((mime, data))
}

fn convert_content(content: &Content) -> Vec<Value> {
    match content {
        Content::Text(text) => vec![json!({ "text": text })],
        Content::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(json!({ "text": text })),
                ContentBlock::ImageUrl { image_url } => {
                    let (mime_type, data) = parse_data_uri(&image_url.url)?;
                    Some(json!({
                        "inline_data": { "mime_type": mime_type, "data": data }
                    }))
                }
            })
            .collect(),
    }
}

pub(crate) fn build_generate_payload(request: &ChatRequest) -> Value {
    let mut system_parts: Vec<Value> = Vec::new();
    let mut contents: Vec<Value> = Vec::new();

    for msg in &request.messages {
        match msg {
            Message::System { content } => system_parts.extend(convert_content(content)),
            Message::Human { content } => contents.push(json!({
                "role": "user",
                "parts": convert_content(content),
            })),
            Message::AI { content } => {
                let parts = content.as_ref().map(convert_content).unwrap_or_default();
                contents.push(json!({ "role": "model", "parts": parts }));
            }
        }
    }

    let mut payload = json!({ "contents": contents });
    let obj = payload.as_object_mut().expect("payload is an object");

    if !system_parts.is_empty() {
        obj.insert(
            "systemInstruction".to_string(),
            json!({ "parts": system_parts }),
        );
    }

    let mut generation_config = serde_json::Map::new();
    if let Some(temp) = request.options.temperature {
        generation_config.insert("temperature".to_string(), json!(temp));
    }
    if let Some(max_tokens) = request.options.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }
    if !generation_config.is_empty() {
        obj.insert("generationConfig".to_string(), Value::Object(generation_config));
    }

    payload
}

pub(crate) fn extract_generate_content(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait::async_trait]
impl ChatClient for GoogleClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = build_generate_payload(&request);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .http_client
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("Google request failed")?;

        let status = response.status();
        let body: Value = response.json().await.context("Invalid Google response body")?;

        if !status.is_success() {
            anyhow::bail!("Google returned {}: {}", status, body);
        }

        Ok(ChatResponse { content: extract_generate_content(&body), raw: body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageUrl;

    #[test]
    fn data_uri_parses_mime_and_payload() {
        let (mime, data) = parse_data_uri("data:image/png;base64,AAAA").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(data, "AAAA");
        assert!(parse_data_uri("https://example.com/a.png").is_none());
    }

    #[test]
    fn generate_payload_separates_system_instruction() {
        let request = ChatRequest::new(vec![
            Message::system("short titles only"),
            Message::human("hello"),
        ]);
        let payload = build_generate_payload(&request);
        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "short titles only");
        assert_eq!(payload["contents"][0]["role"], "user");
    }

    #[test]
    fn generate_payload_inlines_image_data() {
        let request = ChatRequest::new(vec![Message::Human {
            content: Content::Blocks(vec![
                ContentBlock::Text { text: "what is this".into() },
                ContentBlock::ImageUrl {
                    image_url: ImageUrl { url: "data:image/jpeg;base64,QUJD".into() },
                },
            ]),
        }]);
        let payload = build_generate_payload(&request);
        let parts = payload["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "QUJD");
    }

    #[test]
    fn extract_generate_content_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Hel" }, { "text": "lo" }
            ] } }]
        });
        assert_eq!(extract_generate_content(&body).as_deref(), Some("Hello"));
    }
}
