use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized message emitted to the browser.
///
/// This is the discriminated union the normalization pipeline produces from
/// the engine's raw update stream, and that the history endpoint reconstructs
/// from persisted checkpoints. `human` and `error` variants never travel as
/// unnamed SSE data frames; errors use the dedicated `error` event instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    Human { data: HumanPayload },
    Ai { data: AiPayload },
    Tool { data: ToolPayload },
    Error { data: ErrorPayload },
}

impl ChatMessage {
    /// Stable identifier of the underlying message, used for consumer-side
    /// dedup when the same logical message arrives fragmented.
    pub fn id(&self) -> &str {
        match self {
            ChatMessage::Human { data } => &data.id,
            ChatMessage::Ai { data } => &data.id,
            ChatMessage::Tool { data } => &data.id,
            ChatMessage::Error { data } => &data.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanPayload {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_kwargs: Option<Value>,
}

/// Payload of an AI delta. `tool_calls` and friends are passed through
/// verbatim; their inner shape belongs to the engine, not to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPayload {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_chunks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_kwargs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPayload {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub id: String,
    pub message: String,
}

/// One frame of a turn as delivered to the transport layer.
///
/// `Message` frames are forwarded as unnamed SSE data events; the other
/// variants map to the named `title_generated`, `error` and `done` events.
/// A turn ends with either `Done` (success, at most one `TitleGenerated`
/// immediately before it) or `Error` (nothing follows).
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Message(ChatMessage),
    TitleGenerated { title: String },
    Error { message: String, thread_id: String },
    Done,
}

impl PartialEq for ChatMessage {
    fn eq(&self, other: &Self) -> bool {
        serde_json::to_value(self).ok() == serde_json::to_value(other).ok()
    }
}
