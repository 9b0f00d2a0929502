//! Classification of the engine's loosely-typed message records.
//!
//! The engine serializes messages in more than one envelope: a plain dict
//! with a `type` tag (`"ai"`, `"tool"`, `"human"`), a chunk dict tagged with
//! the constructor name (`"AIMessageChunk"`, ...), or the serialized
//! constructor form `{type: "constructor", id: [..., "AIMessage"], kwargs:
//! {...}}`. One function inspects that small field set and narrows each
//! record into an explicit sum type; anything it does not recognize is
//! `Unknown` and dropped, never an error.

use crate::update::{node_kind, NodeKind, RawUpdate};
use genie_types::{AiPayload, ChatMessage, HumanPayload, ToolPayload};
use serde_json::Value;

/// Outcome of classifying one raw message record.
#[derive(Debug, Clone)]
pub enum MessageKind {
    AiDelta(AiPayload),
    ToolResult(ToolPayload),
    Unknown,
}

fn tag_matches(message: &Value, type_tags: &[&str], constructor_marker: &str) -> bool {
    let tag = message.get("type").and_then(Value::as_str);

    if let Some(tag) = tag {
        if type_tags.contains(&tag) {
            return true;
        }
        // Serialized constructor form: id is a module path ending in the class name.
        if tag == "constructor" {
            if let Some(path) = message.get("id").and_then(Value::as_array) {
                return path
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|segment| segment.contains(constructor_marker));
            }
        }
    }

    false
}

fn is_ai_message(message: &Value) -> bool {
    tag_matches(message, &["ai", "AIMessage", "AIMessageChunk"], "AIMessage")
}

fn is_tool_message(message: &Value) -> bool {
    tag_matches(message, &["tool", "ToolMessage", "ToolMessageChunk"], "ToolMessage")
}

fn is_human_message(message: &Value) -> bool {
    tag_matches(message, &["human", "HumanMessage"], "HumanMessage")
}

/// Field container: the serialized constructor form nests everything under
/// `kwargs`; the dict forms carry fields at the top level.
fn fields_of(message: &Value) -> &Value {
    message.get("kwargs").filter(|k| k.is_object()).unwrap_or(message)
}

/// Textual content of a message. Strings pass through, block arrays join
/// their text parts, anything else is stringified.
fn extract_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .map(|block| match block {
                Value::String(text) => text.clone(),
                other => other
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            })
            .collect(),
        Some(other) => other.to_string(),
    }
}

fn non_empty_array(value: Option<&Value>) -> bool {
    value.and_then(Value::as_array).is_some_and(|a| !a.is_empty())
}

fn has_tool_call_data(fields: &Value) -> bool {
    non_empty_array(fields.get("tool_calls")) || non_empty_array(fields.get("tool_call_chunks"))
}

/// Older providers ship tool calls as `functionCall` entries inside a
/// content block array.
fn has_legacy_function_call(fields: &Value) -> bool {
    fields
        .get("content")
        .and_then(Value::as_array)
        .is_some_and(|blocks| {
            blocks
                .iter()
                .any(|block| block.as_object().is_some_and(|o| o.contains_key("functionCall")))
        })
}

fn message_id(fields: &Value) -> String {
    fields
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn ai_payload(fields: &Value) -> AiPayload {
    AiPayload {
        id: message_id(fields),
        content: extract_text(fields.get("content")),
        tool_calls: fields.get("tool_calls").cloned(),
        tool_call_chunks: fields.get("tool_call_chunks").cloned(),
        additional_kwargs: fields.get("additional_kwargs").cloned(),
        response_metadata: fields.get("response_metadata").cloned(),
    }
}

fn tool_payload(fields: &Value) -> ToolPayload {
    let content = match fields.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    ToolPayload {
        id: message_id(fields),
        content,
        tool_call_id: fields
            .get("tool_call_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        name: fields.get("name").and_then(Value::as_str).map(str::to_string),
    }
}

/// Narrow one raw message record. An AI record only counts when it carries
/// something worth forwarding: tool-call data, a legacy function call, or
/// non-empty text.
pub fn classify_message(message: &Value) -> MessageKind {
    if !message.is_object() {
        return MessageKind::Unknown;
    }

    if is_ai_message(message) {
        let fields = fields_of(message);
        let payload = ai_payload(fields);
        if has_tool_call_data(fields)
            || has_legacy_function_call(fields)
            || !payload.content.trim().is_empty()
        {
            return MessageKind::AiDelta(payload);
        }
        return MessageKind::Unknown;
    }

    if is_tool_message(message) {
        return MessageKind::ToolResult(tool_payload(fields_of(message)));
    }

    MessageKind::Unknown
}

/// Messages carried by a node delta; single records are wrapped as a
/// one-element slice.
fn node_messages(delta: &Value) -> Vec<&Value> {
    match delta.get("messages") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
        None => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admit {
    AiOnly,
    ToolOnly,
    Both,
}

fn scan_node(delta: &Value, admit: Admit, out: &mut Vec<ChatMessage>) {
    if !delta.is_object() {
        return;
    }

    for message in node_messages(delta) {
        match classify_message(message) {
            MessageKind::AiDelta(data) if admit != Admit::ToolOnly => {
                out.push(ChatMessage::Ai { data });
            }
            MessageKind::ToolResult(data) if admit != Admit::AiOnly => {
                out.push(ChatMessage::Tool { data });
            }
            _ => {}
        }
    }
}

/// Normalize one raw update record into ordered chat messages.
///
/// The fixed model node admits AI records, the fixed tools node admits tool
/// results, and every dynamically named sub-agent node is scanned for both.
/// The interrupt marker is observed but translated to nothing here; the
/// approval-resume path consumes it. Record kinds other than `updates` are
/// dropped wholesale.
pub fn scan_update(update: &RawUpdate) -> Vec<ChatMessage> {
    let mut out = Vec::new();

    if !update.is_updates() {
        return out;
    }

    // Known nodes first, in their fixed order, then the dynamic agent nodes.
    if let Some(delta) = update.payload.get(crate::update::MODEL_NODE) {
        scan_node(delta, Admit::AiOnly, &mut out);
    }
    if let Some(delta) = update.payload.get(crate::update::TOOLS_NODE) {
        scan_node(delta, Admit::ToolOnly, &mut out);
    }

    for (name, delta) in &update.payload {
        if let NodeKind::Agent(_) = node_kind(name) {
            scan_node(delta, Admit::Both, &mut out);
        }
    }

    out
}

/// Classify one message out of a persisted checkpoint for the history view.
/// Unlike the live path this also surfaces human turns.
pub fn classify_history_message(message: &Value) -> Option<ChatMessage> {
    match classify_message(message) {
        MessageKind::AiDelta(data) => return Some(ChatMessage::Ai { data }),
        MessageKind::ToolResult(data) => return Some(ChatMessage::Tool { data }),
        MessageKind::Unknown => {}
    }

    if message.is_object() && is_human_message(message) {
        let fields = fields_of(message);
        return Some(ChatMessage::Human {
            data: HumanPayload {
                id: message_id(fields),
                content: extract_text(fields.get("content")),
                additional_kwargs: fields.get("additional_kwargs").cloned(),
            },
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn updates(payload: Value) -> RawUpdate {
        let map: Map<String, Value> = payload.as_object().unwrap().clone();
        RawUpdate::updates(map)
    }

    #[test]
    fn plain_ai_dict_with_text_is_an_ai_delta() {
        let msg = json!({ "type": "ai", "id": "m-1", "content": "Hello" });
        match classify_message(&msg) {
            MessageKind::AiDelta(data) => {
                assert_eq!(data.id, "m-1");
                assert_eq!(data.content, "Hello");
            }
            other => panic!("expected AiDelta, got {:?}", other),
        }
    }

    #[test]
    fn serialized_constructor_envelope_is_recognized() {
        // The shape the engine uses for fully serialized messages.
        let msg = json!({
            "type": "constructor",
            "id": ["langchain_core", "messages", "AIMessage"],
            "kwargs": { "content": "Hello" }
        });
        match classify_message(&msg) {
            MessageKind::AiDelta(data) => assert_eq!(data.content, "Hello"),
            other => panic!("expected AiDelta, got {:?}", other),
        }
    }

    #[test]
    fn empty_ai_text_without_tool_calls_is_unknown() {
        let msg = json!({ "type": "ai", "content": "   " });
        assert!(matches!(classify_message(&msg), MessageKind::Unknown));
    }

    #[test]
    fn empty_ai_text_with_tool_calls_still_counts() {
        let msg = json!({
            "type": "AIMessageChunk",
            "content": "",
            "tool_calls": [{ "name": "weather__get_forecast", "args": {} }]
        });
        assert!(matches!(classify_message(&msg), MessageKind::AiDelta(_)));
    }

    #[test]
    fn legacy_function_call_block_counts_as_ai() {
        let msg = json!({
            "type": "ai",
            "content": [{ "functionCall": { "name": "lookup" } }]
        });
        assert!(matches!(classify_message(&msg), MessageKind::AiDelta(_)));
    }

    #[test]
    fn block_array_text_is_joined() {
        let msg = json!({
            "type": "ai",
            "content": [ "Hel", { "type": "text", "text": "lo" } ]
        });
        match classify_message(&msg) {
            MessageKind::AiDelta(data) => assert_eq!(data.content, "Hello"),
            other => panic!("expected AiDelta, got {:?}", other),
        }
    }

    #[test]
    fn tool_message_maps_to_tool_result() {
        let msg = json!({
            "type": "tool",
            "id": "t-1",
            "content": "42",
            "tool_call_id": "call-9",
            "name": "calc__add"
        });
        match classify_message(&msg) {
            MessageKind::ToolResult(data) => {
                assert_eq!(data.content, "42");
                assert_eq!(data.tool_call_id.as_deref(), Some("call-9"));
                assert_eq!(data.name.as_deref(), Some("calc__add"));
            }
            other => panic!("expected ToolResult, got {:?}", other),
        }
    }

    #[test]
    fn tool_message_json_content_is_stringified() {
        let msg = json!({ "type": "tool", "content": { "ok": true } });
        match classify_message(&msg) {
            MessageKind::ToolResult(data) => assert_eq!(data.content, "{\"ok\":true}"),
            other => panic!("expected ToolResult, got {:?}", other),
        }
    }

    #[test]
    fn unrecognized_shapes_are_unknown() {
        assert!(matches!(classify_message(&json!("just a string")), MessageKind::Unknown));
        assert!(matches!(classify_message(&json!({ "type": "system" })), MessageKind::Unknown));
        assert!(matches!(classify_message(&json!({})), MessageKind::Unknown));
    }

    #[test]
    fn model_node_yields_ai_events() {
        let update = updates(json!({
            "model_request": { "messages": [{
                "type": "constructor",
                "id": ["langchain", "AIMessage"],
                "kwargs": { "content": "Hello" }
            }] }
        }));
        let events = scan_update(&update);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ChatMessage::Ai { data } => assert_eq!(data.content, "Hello"),
            other => panic!("expected ai, got {:?}", other),
        }
    }

    #[test]
    fn model_node_ignores_tool_shaped_records() {
        let update = updates(json!({
            "model_request": { "messages": [{ "type": "tool", "content": "x" }] }
        }));
        assert!(scan_update(&update).is_empty());
    }

    #[test]
    fn tools_node_ignores_ai_shaped_records() {
        let update = updates(json!({
            "tools": { "messages": [{ "type": "ai", "content": "sneaky" }] }
        }));
        assert!(scan_update(&update).is_empty());
    }

    #[test]
    fn dynamic_agent_node_admits_tool_results() {
        let update = updates(json!({
            "custom_node_7": { "messages": [{
                "type": "tool",
                "content": "done",
                "tool_call_id": "c-1",
                "name": "a__b"
            }] }
        }));
        let events = scan_update(&update);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ChatMessage::Tool { .. }));
    }

    #[test]
    fn model_and_tool_order_is_preserved_within_a_record() {
        let update = updates(json!({
            "model_request": { "messages": [{ "type": "ai", "content": "calling" }] },
            "tools": { "messages": [{ "type": "tool", "content": "result" }] }
        }));
        let events = scan_update(&update);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ChatMessage::Ai { .. }));
        assert!(matches!(events[1], ChatMessage::Tool { .. }));
    }

    #[test]
    fn interrupt_marker_translates_to_nothing() {
        let update = updates(json!({
            "__interrupt__": [{ "value": { "tool": "weather__get_forecast" } }]
        }));
        assert!(scan_update(&update).is_empty());
    }

    #[test]
    fn non_updates_kinds_are_dropped() {
        let mut update = updates(json!({
            "model_request": { "messages": [{ "type": "ai", "content": "Hello" }] }
        }));
        update.kind = "values".to_string();
        assert!(scan_update(&update).is_empty());
    }

    #[test]
    fn single_message_object_is_wrapped() {
        let update = updates(json!({
            "model_request": { "messages": { "type": "ai", "content": "solo" } }
        }));
        assert_eq!(scan_update(&update).len(), 1);
    }

    #[test]
    fn history_classification_includes_human_turns() {
        let human = json!({ "type": "human", "id": "h-1", "content": "hi there" });
        match classify_history_message(&human) {
            Some(ChatMessage::Human { data }) => assert_eq!(data.content, "hi there"),
            other => panic!("expected human, got {:?}", other),
        }

        let system = json!({ "type": "system", "content": "be helpful" });
        assert!(classify_history_message(&system).is_none());
    }
}
