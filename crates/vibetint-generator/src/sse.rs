//! Server-Sent Events (SSE) stream parsing.
//!
//! Both the Anthropic and Gemini APIs stream responses as SSE. The field
//! accumulation lives in [`SseParser`], a pure line-at-a-time state
//! machine, with [`parse_sse_stream`] adapting it over a reqwest response
//! body. Providers interpret the event payloads themselves.

use futures_util::StreamExt;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::GeneratorError;

/// A single SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type (e.g., "message_start", "content_block_delta").
    pub event: Option<String>,
    /// The event data, with multi-line `data:` fields joined by newlines.
    pub data: String,
}

/// Accumulates `event:`/`data:` fields until a blank line closes the event.
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of the stream. Returns the completed event when the
    /// line is the blank separator that closes one.
    pub fn push_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take_event();
        }
        if let Some(event_type) = line.strip_prefix("event: ") {
            self.event = Some(event_type.to_string());
        } else if let Some(data) = line.strip_prefix("data: ") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data);
        }
        // Other fields (id:, retry:, comments) are ignored.
        None
    }

    /// Flush an unterminated trailing event once the stream ends.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.take_event()
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data),
        })
    }
}

/// Parse an SSE stream from a reqwest response, calling `on_event` for
/// each complete event.
pub async fn parse_sse_stream(
    response: reqwest::Response,
    mut on_event: impl FnMut(SseEvent),
) -> Result<(), GeneratorError> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
    let mut lines = reader.lines();

    let mut parser = SseParser::new();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| GeneratorError::Network(e.to_string()))?
    {
        if let Some(event) = parser.push_line(&line) {
            on_event(event);
        }
    }
    if let Some(event) = parser.finish() {
        on_event(event);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(lines: &[&str]) -> Vec<SseEvent> {
        let mut parser = SseParser::new();
        let mut events = Vec::new();
        for line in lines {
            if let Some(event) = parser.push_line(line) {
                events.push(event);
            }
        }
        if let Some(event) = parser.finish() {
            events.push(event);
        }
        events
    }

    #[test]
    fn parses_typed_events() {
        let events = collect(&[
            "event: content_block_delta",
            r#"data: {"delta":{"type":"text_delta","text":"hi"}}"#,
            "",
            "event: message_stop",
            "data: {}",
            "",
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.as_deref(), Some("content_block_delta"));
        assert!(events[0].data.contains("text_delta"));
        assert_eq!(events[1].event.as_deref(), Some("message_stop"));
    }

    #[test]
    fn joins_multi_line_data() {
        let events = collect(&["data: first", "data: second", ""]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "first\nsecond");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn ignores_comments_and_unknown_fields() {
        let events = collect(&[": keep-alive", "id: 42", "retry: 100", "data: x", ""]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn blank_lines_without_data_emit_nothing() {
        assert!(collect(&["", "", "event: orphan", ""]).is_empty());
    }

    #[test]
    fn trailing_event_is_flushed() {
        let events = collect(&["data: tail"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "tail");
    }
}
