use crate::spec::{RunSpec, TurnInput};
use crate::update::RawUpdate;
use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::pin::Pin;

/// HTTP client for the external agent-graph engine.
///
/// One call submits one run and returns the engine's update stream decoded
/// into [`RawUpdate`] records. No execution state is held here; the engine
/// owns checkpointing against the thread id carried in the spec.
pub struct GraphClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GraphClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Submit one turn and stream the engine's raw updates.
    pub async fn stream_run(
        &self,
        spec: &RunSpec,
        input: TurnInput,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<RawUpdate>> + Send>>> {
        let payload = json!({
            "thread_id": spec.thread_id,
            "agent": spec.to_payload(),
            "input": input.to_payload(),
            "stream_mode": ["updates"],
            "config": { "recursion_limit": spec.recursion_limit },
        });

        let response = self
            .http_client
            .post(format!("{}/runs/stream", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Graph engine request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Graph engine returned {}: {}", status, body);
        }

        Ok(parse_update_stream(response))
    }
}

/// Decode the engine's SSE body into raw update records.
///
/// Frames look like `event: <kind>` followed by `data: {json}`; a missing
/// event line defaults the kind to `updates`. Data lines that are not JSON
/// objects are dropped, matching the tolerate-unknown-shapes policy.
fn parse_update_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<RawUpdate>> + Send>> {
    let byte_stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = LineBuffer::with_capacity(4096);
        let mut pending_kind: Option<String> = None;

        'outer: while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    break;
                }
            };

            buffer.extend(&bytes);

            while let Some(line_result) = buffer.next_line() {
                let line = match line_result {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(e);
                        break 'outer;
                    }
                };

                if line.is_empty() {
                    // Frame boundary; a dangling event line without data is dropped.
                    pending_kind = None;
                    continue;
                }

                if let Some(kind) = line.strip_prefix("event: ") {
                    pending_kind = Some(kind.to_string());
                    continue;
                }

                if let Some(data) = line.strip_prefix("data: ") {
                    if data == "[DONE]" {
                        break 'outer;
                    }

                    let kind = pending_kind
                        .take()
                        .unwrap_or_else(|| crate::update::UPDATES_KIND.to_string());

                    match serde_json::from_str::<Value>(data) {
                        Ok(Value::Object(payload)) => {
                            yield Ok(RawUpdate { kind, payload });
                        }
                        Ok(_) | Err(_) => {
                            tracing::debug!("Dropping non-object update frame");
                        }
                    }
                }
            }
        }
    })
}

/// Byte buffer that hands out complete lines as they arrive.
struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self { buffer: VecDeque::with_capacity(capacity) }
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line, trimmed, or `None` until one is available.
    fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line) => Some(Ok(line.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8 in stream: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_buffer_splits_on_newlines() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"event: updates\ndata: {}\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "event: updates");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: {}");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn line_buffer_waits_for_complete_lines() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"data: {\"par");
        assert!(buffer.next_line().is_none());

        buffer.extend(b"tial\": true}\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: {\"partial\": true}");
    }

    #[test]
    fn line_buffer_trims_carriage_returns() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"data: {}\r\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: {}");
    }
}
