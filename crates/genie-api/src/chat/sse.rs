//! Transport adapter: wrap the normalized event sequence as server-sent
//! events. Content events travel as unnamed data frames; title, error and
//! done use named events. A `: connected` comment opens every stream.

use axum::response::sse::Event;
use futures::{stream, Stream, StreamExt};
use genie_types::TurnEvent;
use serde_json::json;
use std::convert::Infallible;

fn json_event(event: Event, body: &impl serde::Serialize) -> Event {
    match event.json_data(body) {
        Ok(event) => event,
        // Serialization of our own wire types cannot realistically fail;
        // degrade to a comment frame rather than poisoning the stream.
        Err(e) => {
            tracing::error!("Failed to serialize SSE frame: {}", e);
            Event::default().comment("serialization error")
        }
    }
}

/// Map one normalized event to its SSE frame.
pub fn to_frame(event: TurnEvent) -> Event {
    match event {
        TurnEvent::Message(message) => json_event(Event::default(), &message),
        TurnEvent::TitleGenerated { title } => {
            json_event(Event::default().event("title_generated"), &json!({ "title": title }))
        }
        TurnEvent::Error { message, thread_id } => json_event(
            Event::default().event("error"),
            &json!({ "message": message, "threadId": thread_id }),
        ),
        TurnEvent::Done => Event::default().event("done").data("{}"),
    }
}

/// Frame a turn's event sequence, preceded by the connection comment.
pub fn frame_stream<S>(events: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = TurnEvent>,
{
    stream::once(async { Event::default().comment("connected") })
        .chain(events.map(to_frame))
        .map(Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genie_types::{AiPayload, ChatMessage};

    fn render(event: Event) -> String {
        // The Display/Debug form contains the wire fields we care about.
        format!("{:?}", event)
    }

    #[test]
    fn message_frames_are_unnamed() {
        let frame = to_frame(TurnEvent::Message(ChatMessage::Ai {
            data: AiPayload {
                id: "m-1".into(),
                content: "Hello".into(),
                tool_calls: None,
                tool_call_chunks: None,
                additional_kwargs: None,
                response_metadata: None,
            },
        }));
        let rendered = render(frame);
        assert!(rendered.contains("ai"));
        assert!(rendered.contains("Hello"));
        // Unnamed frames have no `event:` field.
        assert!(!rendered.contains("event:"));
    }

    #[test]
    fn named_frames_carry_their_event_names() {
        let rendered = render(to_frame(TurnEvent::TitleGenerated { title: "T".into() }));
        assert!(rendered.contains("title_generated"));

        let rendered = render(to_frame(TurnEvent::Error {
            message: "boom".into(),
            thread_id: "t-1".into(),
        }));
        assert!(rendered.contains("error"));
        assert!(rendered.contains("threadId"));

        let rendered = render(to_frame(TurnEvent::Done));
        assert!(rendered.contains("done"));
    }
}
