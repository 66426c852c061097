//! Server-Sent Events (SSE) framing.
//!
//! This module turns an HTTP response body into a stream of SSE events.
//!
//! SSE format:
//! ```text
//! data: {"type": "final", "data": "hello"}
//!
//! data:{"type":"done"}
//!
//! data: [DONE]
//! ```
//!
//! `data` lines of one event are joined with `\n`, the event is dispatched
//! on the blank line that follows. Lines starting with `:` are comments.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;

/// One dispatched SSE event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
    /// Value of the `id:` field, if any.
    pub id: Option<String>,
}

/// Extension trait for `reqwest::Response` to enable SSE streaming.
///
/// # Example
/// ```ignore
/// use chatwire::sse::SSEResponseExt;
///
/// let response = client.post(url).json(&body).send().await?;
/// let mut events = response.sse();
/// while let Some(result) = events.next().await {
///     let event = result?;
///     println!("SSE data: {}", event.data);
/// }
/// ```
pub trait SSEResponseExt {
    /// Convert the response body into a stream of SSE events.
    fn sse(self) -> impl Stream<Item = Result<SseEvent, ClientError>> + Send;
}

impl SSEResponseExt for reqwest::Response {
    fn sse(self) -> impl Stream<Item = Result<SseEvent, ClientError>> + Send {
        sse_events(self.bytes_stream())
    }
}

/// Frame a raw byte stream into SSE events.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across chunks are decoded correctly. The stream ends
/// after the first transport error.
pub fn sse_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<SseEvent, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError>,
{
    stream::unfold(
        Some((Box::pin(byte_stream), Vec::<u8>::new(), EventBuilder::default(), false)),
        |state| async move {
            let (mut byte_stream, mut buffer, mut pending, mut stream_ended) = state?;
            loop {
                // Process complete lines from buffer
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line[..pos]);
                    if let Some(event) = pending.feed(line.strip_suffix('\r').unwrap_or(&line)) {
                        let state = (byte_stream, buffer, pending, stream_ended);
                        return Some((Ok(event), Some(state)));
                    }
                }

                // Flush the unterminated last line and event at end of body
                if stream_ended {
                    if !buffer.is_empty() {
                        let line = String::from_utf8_lossy(&buffer).into_owned();
                        buffer.clear();
                        pending.feed(line.strip_suffix('\r').unwrap_or(&line));
                    }
                    return pending.finish().map(|event| (Ok(event), None));
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => return Some((Err(e.into()), None)),
                    None => stream_ended = true,
                }
            }
        },
    )
}

/// Accumulates the fields of the event being read.
#[derive(Debug, Default)]
struct EventBuilder {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl EventBuilder {
    /// Consume one line, returning an event when the line dispatches one.
    fn feed(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.finish();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = parse_field(line);
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    /// Take the pending event; events without data are dropped.
    fn finish(&mut self) -> Option<SseEvent> {
        let builder = std::mem::take(self);
        if builder.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: builder.event,
            data: builder.data.join("\n"),
            id: builder.id,
        })
    }
}

/// Split an SSE line into field name and value.
///
/// A single space after the colon is not part of the value.
///
/// # Example
/// ```
/// use chatwire::sse::parse_field;
///
/// assert_eq!(parse_field("data: {\"key\": \"value\"}"), ("data", "{\"key\": \"value\"}"));
/// assert_eq!(parse_field("data:[DONE]"), ("data", "[DONE]"));
/// assert_eq!(parse_field("retry"), ("retry", ""));
/// ```
pub fn parse_field(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    }
}
