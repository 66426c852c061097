//! HTTP client utilities for talking to the chat backend.
//!
//! This module provides client construction, URL resolution and response
//! status classification shared by the plain and streaming calls.

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use std::collections::HashMap;

use tracing::debug;

use crate::client::ClientError;
use crate::options::{HttpTransport, TransportOptions};

/// Build a configured HTTP client from transport options.
///
/// This applies the proxy, rejecting one that does not parse, and uses the
/// timeout as a connect timeout, so a long-lived event stream is never cut
/// off. Plain requests add the full
/// timeout per request with [`with_request_timeout`].
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(
    transport_options: &TransportOptions<HttpTransport>,
) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.connect_timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.provider.proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            ClientError::Config(format!("invalid proxy URL {proxy_url:?}: {e}"))
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Apply the configured timeout to a single request.
pub fn with_request_timeout(
    request: RequestBuilder,
    transport_options: &TransportOptions<HttpTransport>,
) -> RequestBuilder {
    match transport_options.timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}

/// Add extra headers to a request if specified in transport options.
///
/// # Example
/// ```ignore
/// let mut req = client.post(url);
/// req = add_extra_headers(req, &transport_options.provider.extra_headers);
/// ```
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Resolve an endpoint path against the base URL, appending `segments` as
/// percent-encoded path segments.
///
/// # Example
/// ```
/// use chatwire::http::endpoint_url;
///
/// let url = endpoint_url("http://localhost:8080/api/", "/ai/history/get", &["a b"]).unwrap();
/// assert_eq!(url.as_str(), "http://localhost:8080/api/ai/history/get/a%20b");
/// ```
pub fn endpoint_url(base_url: &str, path: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|e| ClientError::Config(format!("invalid endpoint URL {joined:?}: {e}")))?;

    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("{joined:?} cannot have path segments")))?
            .pop_if_empty()
            .extend(segments);
    }
    Ok(url)
}

/// Reject non-success responses.
///
/// A 4xx other than 429 is a terminal client error and its body is read for
/// the message. Every other non-2xx status keeps its canonical reason.
pub async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if is_terminal_client_error(status) {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%status, error = %e, "failed to read rejection body");
                String::new()
            }
        };
        Err(ClientError::Rejected { status, body })
    } else {
        Err(ClientError::Status {
            status,
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        })
    }
}

fn is_terminal_client_error(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
}
