//! Core client traits and error types.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::dispatch::{self, AbortHandle, ChatHandler};
use crate::model::{ChatRequest, HistoryMessage, SessionId};
use crate::options::TransportOptions;
use crate::stream::ChatStream;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// 4xx other than 429. Not worth retrying.
    #[error("HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("HTTP {status}: {reason}")]
    Status { status: StatusCode, reason: String },

    /// The backend answered 2xx but its envelope reports a failure.
    #[error("API error ({code}): {message}")]
    Api { code: i64, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the same request may succeed later.
    ///
    /// Nothing in this crate retries; this is for callers with their own
    /// policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            ClientError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ClientError::Rejected { .. }
            | ClientError::Parse(_)
            | ClientError::Api { .. }
            | ClientError::Config(_) => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(e) => e.status(),
            ClientError::Rejected { status, .. } | ClientError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Request/response side of a chat backend client.
///
/// Each transport defines its own options type.
///
/// # Associated Types
/// - `TransportProvider`: Transport-specific options (e.g., `HttpTransport`)
///
/// # Required Methods
/// - `request_sessions`, `request_history`: static calls with explicit options
/// - `new`: Constructor to create a client instance
/// - `transport_options`: Accessor for the stored transport options
///
/// # Provided Methods (with default implementations)
/// - `list_sessions`, `history`: use the stored options
#[async_trait]
pub trait Client: Send + Sync + Sized {
    /// Transport-specific options type.
    type TransportProvider: Send + Sync;

    /// List the ids of every known chat session.
    async fn request_sessions(
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<Vec<SessionId>, ClientError>;

    /// Fetch the stored messages of one session, oldest first.
    async fn request_history(
        session_id: &SessionId,
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<Vec<HistoryMessage>, ClientError>;

    /// Create a new client instance with the given options.
    fn new(transport_options: TransportOptions<Self::TransportProvider>) -> Self;

    /// Get reference to the transport options field.
    fn transport_options(&self) -> &TransportOptions<Self::TransportProvider>;

    /// List sessions using the client's options.
    async fn list_sessions(&self) -> Result<Vec<SessionId>, ClientError> {
        Self::request_sessions(self.transport_options()).await
    }

    /// Fetch a session's history using the client's options.
    async fn history(&self, session_id: &SessionId) -> Result<Vec<HistoryMessage>, ClientError> {
        Self::request_history(session_id, self.transport_options()).await
    }
}

/// Extension trait for streaming chat.
///
/// # Required Methods
/// - `request_stream`: Static streaming method
///
/// # Provided Methods (with default implementations)
/// - `chat_stream`: Uses the stored options
/// - `send_chat_message`: Callback delivery on a background task
#[async_trait]
pub trait StreamingClient: Client {
    /// Open the chat stream for one message.
    ///
    /// Fails if the connection cannot be opened or the backend refuses it.
    /// Once open, every outcome (including transport errors) arrives as a
    /// [`StreamEvent`](crate::stream::StreamEvent).
    async fn request_stream(
        request: ChatRequest,
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<ChatStream, ClientError>;

    /// Open the chat stream using the client's options.
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, ClientError> {
        Self::request_stream(request, self.transport_options()).await
    }

    /// Send a message and deliver the answer to `handler` on a background
    /// task.
    ///
    /// The handler sees at most one of `on_error` / `on_complete`, and
    /// nothing after it or after [`AbortHandle::abort`]. Must be called
    /// within a tokio runtime.
    fn send_chat_message<H>(&self, request: ChatRequest, handler: H) -> AbortHandle
    where
        Self: 'static,
        H: ChatHandler,
        Self::TransportProvider: Clone + 'static,
    {
        let transport_options = self.transport_options().clone();
        dispatch::spawn(
            async move { Self::request_stream(request, &transport_options).await },
            handler,
        )
    }
}
