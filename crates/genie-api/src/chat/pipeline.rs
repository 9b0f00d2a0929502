//! The streaming normalization pipeline.
//!
//! Consumes the raw, heterogeneously-shaped update stream of one engine run
//! and produces the finite, ordered sequence of wire events for the
//! transport layer. One suspension point per raw chunk; no buffering beyond
//! the chunk currently in hand, so relative order always survives.

use crate::chat::title::TitleTask;
use futures::{Stream, StreamExt};
use genie_graph::scan_update;
use genie_graph::RawUpdate;
use genie_types::{ChatMessage, TurnEvent, PLACEHOLDER_THREAD_ID};
use std::pin::Pin;
use std::sync::Arc;

/// Identifiers a turn runs under.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub thread_id: String,
    pub user_text: String,
}

/// Normalize one turn's raw update stream.
///
/// Every AI delta's text is appended into a running buffer; after the raw
/// stream drains, that buffer feeds the best-effort title task, whose result
/// (if any) is emitted as one `TitleGenerated` event before the terminal
/// `Done`. A raw-stream failure terminates the sequence with exactly one
/// `Error` event instead — nothing follows it, not even `Done`.
pub fn normalize_turn<S>(
    raw: S,
    ctx: TurnContext,
    title_task: Arc<dyn TitleTask>,
) -> Pin<Box<dyn Stream<Item = TurnEvent> + Send>>
where
    S: Stream<Item = anyhow::Result<RawUpdate>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut raw = Box::pin(raw);
        let mut ai_text = String::new();

        while let Some(item) = raw.next().await {
            match item {
                Ok(update) => {
                    for message in scan_update(&update) {
                        if let ChatMessage::Ai { data } = &message {
                            ai_text.push_str(&data.content);
                        }
                        yield TurnEvent::Message(message);
                    }
                }
                Err(e) => {
                    tracing::error!("Stream error on thread {}: {:#}", ctx.thread_id, e);
                    yield TurnEvent::Error {
                        message: e.to_string(),
                        thread_id: ctx.thread_id.clone(),
                    };
                    return;
                }
            }
        }

        if !ai_text.is_empty() && ctx.thread_id != PLACEHOLDER_THREAD_ID {
            if let Some(title) = title_task
                .generate(&ctx.thread_id, &ctx.user_text, &ai_text)
                .await
            {
                yield TurnEvent::TitleGenerated { title };
            }
        }

        yield TurnEvent::Done;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    /// Title stub that records what it was asked and answers a fixed title.
    struct StubTitleTask {
        title: Option<String>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl StubTitleTask {
        fn some(title: &str) -> Arc<Self> {
            Arc::new(Self { title: Some(title.to_string()), calls: Mutex::new(Vec::new()) })
        }

        fn none() -> Arc<Self> {
            Arc::new(Self { title: None, calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<(String, String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TitleTask for StubTitleTask {
        async fn generate(
            &self,
            thread_id: &str,
            user_text: &str,
            ai_text: &str,
        ) -> Option<String> {
            self.calls.lock().unwrap().push((
                thread_id.to_string(),
                user_text.to_string(),
                ai_text.to_string(),
            ));
            self.title.clone()
        }
    }

    fn updates(payload: Value) -> RawUpdate {
        let map: Map<String, Value> = payload.as_object().unwrap().clone();
        RawUpdate::updates(map)
    }

    fn ai_update(text: &str) -> RawUpdate {
        updates(json!({
            "model_request": { "messages": [{
                "type": "constructor",
                "id": ["langchain", "messages", "AIMessage"],
                "kwargs": { "content": text }
            }] }
        }))
    }

    fn tool_update(content: &str) -> RawUpdate {
        updates(json!({
            "tools": { "messages": [{
                "type": "tool",
                "content": content,
                "tool_call_id": "c-1",
                "name": "srv__tool"
            }] }
        }))
    }

    fn ctx(thread_id: &str) -> TurnContext {
        TurnContext { thread_id: thread_id.to_string(), user_text: "ask".to_string() }
    }

    async fn collect<S>(s: S) -> Vec<TurnEvent>
    where
        S: Stream<Item = TurnEvent>,
    {
        s.collect().await
    }

    fn ok_stream(updates: Vec<RawUpdate>) -> impl Stream<Item = anyhow::Result<RawUpdate>> {
        stream::iter(updates.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn one_ai_event_per_ai_record_in_order() {
        let events = collect(normalize_turn(
            ok_stream(vec![ai_update("one"), ai_update("two"), ai_update("three")]),
            ctx(PLACEHOLDER_THREAD_ID),
            StubTitleTask::none(),
        ))
        .await;

        let texts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TurnEvent::Message(ChatMessage::Ai { data }) => Some(data.content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(events.last(), Some(&TurnEvent::Done));
    }

    #[tokio::test]
    async fn tool_event_follows_its_ai_event() {
        let events = collect(normalize_turn(
            ok_stream(vec![ai_update("calling a tool"), tool_update("result")]),
            ctx(PLACEHOLDER_THREAD_ID),
            StubTitleTask::none(),
        ))
        .await;

        let kinds: Vec<_> = events
            .iter()
            .map(|e| match e {
                TurnEvent::Message(ChatMessage::Ai { .. }) => "ai",
                TurnEvent::Message(ChatMessage::Tool { .. }) => "tool",
                TurnEvent::Done => "done",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["ai", "tool", "done"]);
    }

    #[tokio::test]
    async fn accumulated_text_is_concatenation_of_ai_contents() {
        let stub = StubTitleTask::some("A Title");
        let events = collect(normalize_turn(
            ok_stream(vec![ai_update("Hel"), ai_update("lo")]),
            ctx("662a2f9c8b3e4d0012345678"),
            Arc::clone(&stub) as Arc<dyn TitleTask>,
        ))
        .await;

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "Hello");

        // Title precedes the terminal done marker.
        let tail: Vec<_> = events.iter().rev().take(2).collect();
        assert_eq!(tail[0], &TurnEvent::Done);
        assert!(matches!(tail[1], TurnEvent::TitleGenerated { .. }));
    }

    #[tokio::test]
    async fn no_title_for_placeholder_thread() {
        let stub = StubTitleTask::some("A Title");
        let events = collect(normalize_turn(
            ok_stream(vec![ai_update("Hello")]),
            ctx(PLACEHOLDER_THREAD_ID),
            Arc::clone(&stub) as Arc<dyn TitleTask>,
        ))
        .await;

        assert!(stub.calls().is_empty());
        assert!(!events
            .iter()
            .any(|e| matches!(e, TurnEvent::TitleGenerated { .. })));
        assert_eq!(events.last(), Some(&TurnEvent::Done));
    }

    #[tokio::test]
    async fn no_title_for_empty_ai_text() {
        let stub = StubTitleTask::some("A Title");
        let events = collect(normalize_turn(
            ok_stream(vec![tool_update("only tools ran")]),
            ctx("662a2f9c8b3e4d0012345678"),
            Arc::clone(&stub) as Arc<dyn TitleTask>,
        ))
        .await;

        assert!(stub.calls().is_empty());
        assert!(!events
            .iter()
            .any(|e| matches!(e, TurnEvent::TitleGenerated { .. })));
    }

    #[tokio::test]
    async fn raw_stream_failure_ends_with_error_and_no_done() {
        let raw = stream::iter(vec![
            Ok(ai_update("partial")),
            Err(anyhow::anyhow!("engine blew up")),
        ]);
        let events = collect(normalize_turn(
            raw,
            ctx("662a2f9c8b3e4d0012345678"),
            StubTitleTask::some("never emitted"),
        ))
        .await;

        let errors: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(events.last(), errors.last().map(|e| *e));
        assert!(!events.iter().any(|e| matches!(e, TurnEvent::Done)));
        assert!(!events
            .iter()
            .any(|e| matches!(e, TurnEvent::TitleGenerated { .. })));
    }

    #[tokio::test]
    async fn successful_stream_always_ends_with_done() {
        let events = collect(normalize_turn(
            ok_stream(vec![]),
            ctx("662a2f9c8b3e4d0012345678"),
            StubTitleTask::some("unused"),
        ))
        .await;
        assert_eq!(events, vec![TurnEvent::Done]);
    }

    #[tokio::test]
    async fn single_serialized_ai_record_yields_ai_then_done() {
        // Raw record shaped exactly as the engine serializes a model reply.
        let raw = updates(json!({
            "model_request": { "messages": [{
                "type": "constructor",
                "id": ["langchain", "messages", "AIMessage"],
                "kwargs": { "content": "Hello" }
            }] }
        }));

        let events = collect(normalize_turn(
            ok_stream(vec![raw]),
            ctx(PLACEHOLDER_THREAD_ID),
            StubTitleTask::some("skipped because placeholder"),
        ))
        .await;

        assert_eq!(events.len(), 2);
        match &events[0] {
            TurnEvent::Message(ChatMessage::Ai { data }) => assert_eq!(data.content, "Hello"),
            other => panic!("expected ai event, got {:?}", other),
        }
        assert_eq!(events[1], TurnEvent::Done);
    }

    #[tokio::test]
    async fn dynamic_node_tool_result_is_forwarded() {
        let raw = updates(json!({
            "custom_node_7": { "messages": [{
                "type": "tool",
                "content": "sub-agent result",
                "tool_call_id": "c-9",
                "name": "srv__tool"
            }] }
        }));

        let events = collect(normalize_turn(
            ok_stream(vec![raw]),
            ctx(PLACEHOLDER_THREAD_ID),
            StubTitleTask::none(),
        ))
        .await;

        let tools: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::Message(ChatMessage::Tool { .. })))
            .collect();
        assert_eq!(tools.len(), 1);
    }

    #[tokio::test]
    async fn unrecognized_records_are_dropped_silently() {
        let raw = updates(json!({
            "model_request": { "messages": [
                { "type": "system", "content": "not forwarded" },
                { "unexpected": true },
                { "type": "ai", "content": "kept" }
            ] }
        }));

        let events = collect(normalize_turn(
            ok_stream(vec![raw]),
            ctx(PLACEHOLDER_THREAD_ID),
            StubTitleTask::none(),
        ))
        .await;

        assert_eq!(events.len(), 2); // one ai + done
    }
}
