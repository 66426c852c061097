//! Data models exchanged with the chat backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::client::ClientError;

/// Envelope code the backend uses for success.
const SUCCESS_CODE: i64 = 200;

/// Opaque key of a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Unknown,
}

/// A message stored in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of the streaming chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    #[serde(rename = "chatId")]
    pub session_id: SessionId,
    pub message: String,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<SessionId>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// A message delivered to the caller while streaming.
///
/// Always carries `content`; any other field the backend sent alongside it
/// is kept untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub content: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// Message whose content is the given JSON value.
    pub fn new(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            extra: Map::new(),
        }
    }

    /// The content when it is plain text.
    pub fn text(&self) -> Option<&str> {
        self.content.as_str()
    }
}

/// Wrapper the backend puts around plain responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// The payload, or an API error when the envelope reports a failure.
    pub fn into_data(self) -> Result<Option<T>, ClientError> {
        if self.code == SUCCESS_CODE {
            Ok(self.data)
        } else {
            Err(ClientError::Api {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            })
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdsData {
    #[serde(default)]
    pub chat_ids: Vec<SessionId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryData {
    #[serde(default)]
    pub chat_id: Option<SessionId>,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// Session listing body: a bare array or an envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionIdsBody {
    List(Vec<SessionId>),
    Envelope(ApiEnvelope<SessionIdsData>),
}

impl SessionIdsBody {
    pub fn into_ids(self) -> Result<Vec<SessionId>, ClientError> {
        match self {
            SessionIdsBody::List(ids) => Ok(ids),
            SessionIdsBody::Envelope(envelope) => {
                Ok(envelope.into_data()?.map(|d| d.chat_ids).unwrap_or_default())
            }
        }
    }
}

/// History body: a bare array or an envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoryBody {
    List(Vec<HistoryMessage>),
    Envelope(ApiEnvelope<HistoryData>),
}

impl HistoryBody {
    pub fn into_messages(self) -> Result<Vec<HistoryMessage>, ClientError> {
        match self {
            HistoryBody::List(messages) => Ok(messages),
            HistoryBody::Envelope(envelope) => {
                Ok(envelope.into_data()?.map(|d| d.messages).unwrap_or_default())
            }
        }
    }
}
