//! Chat event stream.
//!
//! Converts SSE events into the three outcomes a caller cares about and
//! guarantees the stream finishes exactly once.

use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, error, warn};

use crate::client::ClientError;
use crate::frame::Frame;
use crate::model::ChatMessage;
use crate::sse::SseEvent;

/// What a chat stream yields.
///
/// `Error` and `Complete` are always the last item.
#[derive(Debug)]
pub enum StreamEvent {
    Message(ChatMessage),
    Error(ClientError),
    Complete,
}

/// A finite, non-restartable stream of chat events.
pub type ChatStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Per-stream state. Dropping `Open` releases the connection.
enum Phase<S> {
    Open(Pin<Box<S>>),
    Finished,
}

/// Build a chat stream on top of SSE events.
///
/// Frames are handled as follows:
/// - completion sentinel: `Complete`, the source is dropped
/// - final answer or `content` object: `Message`
/// - progress, failure and unrecognized frames: logged and skipped
/// - transport error: `Error`, the source is dropped
/// - end of source without a sentinel: `Complete`
pub fn chat_events<S>(events: S) -> ChatStream
where
    S: Stream<Item = Result<SseEvent, ClientError>> + Send + 'static,
{
    let stream = stream::unfold(Phase::Open(Box::pin(events)), |phase| async move {
        let Phase::Open(mut events) = phase else {
            return None;
        };

        loop {
            let Some(next) = events.next().await else {
                debug!("chat stream closed without completion marker");
                return Some((StreamEvent::Complete, Phase::Finished));
            };

            let event = match next {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "chat stream failed");
                    return Some((StreamEvent::Error(e), Phase::Finished));
                }
            };

            match Frame::parse(&event.data) {
                Frame::Done => {
                    debug!("chat stream completed");
                    return Some((StreamEvent::Complete, Phase::Finished));
                }
                Frame::Final(message) | Frame::Message(message) => {
                    return Some((StreamEvent::Message(message), Phase::Open(events)));
                }
                Frame::Progress { kind, data } => {
                    debug!(kind = kind.as_str(), %data, "progress frame");
                }
                Frame::Failure { message } => {
                    error!(
                        %message,
                        event = ?event.event,
                        id = ?event.id,
                        "backend reported a workflow failure"
                    );
                }
                Frame::Unrecognized(value) => {
                    warn!(
                        %value,
                        event = ?event.event,
                        id = ?event.id,
                        "dropping unrecognized frame"
                    );
                }
            }
        }
    });

    Box::pin(stream)
}
