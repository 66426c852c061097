//! Classification of chat event payloads.
//!
//! Every SSE data payload the backend sends is turned into exactly one
//! [`Frame`]. The rules are applied in this order:
//!
//! 1. legacy sentinel text `[DONE]` / `DONE`
//! 2. `{"type": "done"}`
//! 3. `{"type": "final", "data": ...}`
//! 4. `{"type": "extract" | "news" | "market", ...}`
//! 5. any other object carrying `content`
//! 6. everything else
//!
//! A payload that is not JSON is treated as message text.

use serde_json::{Map, Value};

use crate::model::ChatMessage;

const LEGACY_SENTINELS: [&str; 2] = ["[DONE]", "DONE"];

/// Intermediate workflow step reported before the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Extract,
    News,
    Market,
}

impl ProgressKind {
    fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "extract" => Some(ProgressKind::Extract),
            "news" => Some(ProgressKind::News),
            "market" => Some(ProgressKind::Market),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressKind::Extract => "extract",
            ProgressKind::News => "news",
            ProgressKind::Market => "market",
        }
    }
}

/// One classified event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Completion sentinel, legacy text or `type: "done"`.
    Done,
    /// The final answer, already rewrapped as `{content: data}`.
    Final(ChatMessage),
    /// Workflow progress, not meant for the conversation.
    Progress { kind: ProgressKind, data: Value },
    /// Backend-reported failure (`type: "error"` without `content`).
    Failure { message: String },
    /// A bare `content` object or plain text.
    Message(ChatMessage),
    /// Anything else.
    Unrecognized(Value),
}

impl Frame {
    /// Classify one data payload.
    ///
    /// # Example
    /// ```
    /// use chatwire::frame::Frame;
    /// use chatwire::model::ChatMessage;
    ///
    /// assert_eq!(Frame::parse("[DONE]"), Frame::Done);
    /// assert_eq!(
    ///     Frame::parse(r#"{"type":"final","data":"hello"}"#),
    ///     Frame::Final(ChatMessage::new("hello"))
    /// );
    /// assert_eq!(Frame::parse("hello world"), Frame::Message(ChatMessage::new("hello world")));
    /// ```
    pub fn parse(payload: &str) -> Frame {
        if LEGACY_SENTINELS.contains(&payload) {
            return Frame::Done;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(object)) => Self::from_object(object),
            Ok(other) => Frame::Unrecognized(other),
            Err(_) => Frame::Message(ChatMessage::new(payload)),
        }
    }

    fn from_object(mut object: Map<String, Value>) -> Frame {
        let kind = object.get("type").and_then(Value::as_str).map(str::to_owned);

        match kind.as_deref() {
            Some("done") => return Frame::Done,
            Some("final") => {
                if let Some(data) = object.remove("data") {
                    return Frame::Final(ChatMessage::new(data));
                }
                return Frame::Unrecognized(Value::Object(object));
            }
            // `error` is not a recognized type, a `content` field still wins
            Some("error") if !object.contains_key("content") => {
                let message = object
                    .get("data")
                    .and_then(|data| data.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                return Frame::Failure { message };
            }
            Some(other) => {
                if let Some(kind) = ProgressKind::from_type(other) {
                    let data = object.remove("data").unwrap_or(Value::Null);
                    return Frame::Progress { kind, data };
                }
            }
            None => {}
        }

        match object.remove("content") {
            Some(content) => Frame::Message(ChatMessage {
                content,
                extra: object,
            }),
            None => Frame::Unrecognized(Value::Object(object)),
        }
    }

    /// Whether this frame ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::Done)
    }
}
