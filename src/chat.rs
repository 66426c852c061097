//! HTTP implementation of the chat backend client.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{Client, ClientError, StreamingClient};
use crate::http::{
    add_extra_headers, build_http_client, endpoint_url, ensure_success, with_request_timeout,
};
use crate::model::{ChatRequest, HistoryBody, HistoryMessage, SessionId, SessionIdsBody};
use crate::options::{HttpTransport, TransportOptions};
use crate::sse::SSEResponseExt;
use crate::stream::{chat_events, ChatStream};

const EVENT_STREAM: &str = "text/event-stream";

/// Chat backend client using HTTP transport.
#[derive(Debug, Clone)]
pub struct ChatClient {
    transport_options: TransportOptions<HttpTransport>,
}

impl ChatClient {
    /// Create a new client with the given transport options.
    pub fn new(transport_options: TransportOptions<HttpTransport>) -> Self {
        Self { transport_options }
    }

    /// Create a client configured from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Ok(Self::new(TransportOptions::from_env()?))
    }

    /// GET `path` (plus `segments`) and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        path: &str,
        segments: &[&str],
        transport_options: &TransportOptions<HttpTransport>,
    ) -> Result<T, ClientError> {
        let url = endpoint_url(transport_options.provider.base_url(), path, segments)?;
        debug!(%url, "GET");

        let http_client = build_http_client(transport_options)?;
        let mut req = http_client.get(url);
        req = with_request_timeout(req, transport_options);
        req = add_extra_headers(req, &transport_options.provider.extra_headers);

        let response = ensure_success(req.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new(TransportOptions::new(HttpTransport::default()))
    }
}

#[async_trait]
impl Client for ChatClient {
    type TransportProvider = HttpTransport;

    async fn request_sessions(
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<Vec<SessionId>, ClientError> {
        let path = &transport_options.provider.endpoints.session_ids;
        let body: SessionIdsBody = Self::get_json(path, &[], transport_options).await?;
        body.into_ids()
    }

    async fn request_history(
        session_id: &SessionId,
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<Vec<HistoryMessage>, ClientError> {
        let path = &transport_options.provider.endpoints.history;
        let body: HistoryBody =
            Self::get_json(path, &[session_id.as_str()], transport_options).await?;
        body.into_messages()
    }

    fn new(transport_options: TransportOptions<Self::TransportProvider>) -> Self {
        Self { transport_options }
    }

    fn transport_options(&self) -> &TransportOptions<Self::TransportProvider> {
        &self.transport_options
    }
}

#[async_trait]
impl StreamingClient for ChatClient {
    async fn request_stream(
        request: ChatRequest,
        transport_options: &TransportOptions<Self::TransportProvider>,
    ) -> Result<ChatStream, ClientError> {
        let url = endpoint_url(
            transport_options.provider.base_url(),
            &transport_options.provider.endpoints.chat,
            &[],
        )?;
        debug!(%url, session_id = %request.session_id, "opening chat stream");

        let http_client = build_http_client(transport_options)?;

        let mut req = http_client
            .post(url)
            .header(ACCEPT, EVENT_STREAM)
            .header(CONTENT_TYPE, "application/json");

        req = add_extra_headers(req, &transport_options.provider.extra_headers);

        let response = ensure_success(req.json(&request).send().await?).await?;
        debug!(status = %response.status(), "chat stream open");

        Ok(chat_events(response.sse()))
    }
}
