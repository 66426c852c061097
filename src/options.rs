//! Generic transport options and backend endpoint configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const ENV_BASE_URL: &str = "CHAT_BASE_URL";
const ENV_PROXY: &str = "CHAT_PROXY";
const ENV_TIMEOUT_SECS: &str = "CHAT_TIMEOUT_SECS";

/// Generic transport options containing truly generic transport fields
/// and transport-specific configuration.
///
/// # Type Parameters
/// - `T`: Transport-specific options type
///
/// # Example
/// ```rust
/// use chatwire::options::{HttpTransport, TransportOptions};
/// use std::time::Duration;
///
/// let options = TransportOptions {
///     timeout: Some(Duration::from_secs(30)),
///     provider: HttpTransport::default().with_base_url("http://chat.internal:8080".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions<T> {
    /// Request timeout.
    ///
    /// Bounds the whole exchange for plain requests and only connection
    /// setup for streaming requests.
    pub timeout: Option<Duration>,

    /// Transport-specific options
    pub provider: T,
}

impl<T> TransportOptions<T> {
    /// Create new transport options with transport-specific configuration.
    pub fn new(provider: T) -> Self {
        Self {
            timeout: None,
            provider,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl TransportOptions<HttpTransport> {
    /// Build HTTP transport options from the process environment.
    ///
    /// Reads `CHAT_BASE_URL`, `CHAT_PROXY` and `CHAT_TIMEOUT_SECS`. Unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut provider = HttpTransport::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            provider = provider.with_base_url(base_url);
        }
        if let Some(proxy) = lookup(ENV_PROXY) {
            provider = provider.with_proxy(proxy);
        }

        let mut options = Self::new(provider);
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            options = options.with_timeout(Duration::from_secs(secs));
        }
        Ok(options)
    }
}

/// Paths of the chat backend endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEndpoints {
    /// GET, lists session ids.
    pub session_ids: String,
    /// GET, followed by one path segment holding the session id.
    pub history: String,
    /// POST, answers with an event stream.
    pub chat: String,
}

impl ChatEndpoints {
    /// Endpoints with the workflow chat route, which emits the same event
    /// format as the default one.
    pub fn workflow() -> Self {
        Self {
            chat: "/ai/workflow/chat".to_string(),
            ..Self::default()
        }
    }
}

impl Default for ChatEndpoints {
    fn default() -> Self {
        Self {
            session_ids: "/ai/history/getChatIds".to_string(),
            history: "/ai/history/get".to_string(),
            chat: "/ai/chat".to_string(),
        }
    }
}

/// HTTP-specific transport options.
/// Used as the provider field in `TransportOptions<HttpTransport>`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    /// Base URL of the chat backend, `DEFAULT_BASE_URL` when unset
    pub base_url: Option<String>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,

    /// Endpoint paths
    pub endpoints: ChatEndpoints,
}

impl HttpTransport {
    /// Create new HTTP transport options pointing at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url.into())
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Replace the endpoint paths.
    pub fn with_endpoints(mut self, endpoints: ChatEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The configured base URL or the default one.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}
