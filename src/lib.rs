//! # chatwire - chat backend client
//!
//! An async client for a chat backend that answers with Server-Sent Events.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Session listing and history retrieval
//! - Streaming chat with callback delivery or as a `Stream`
//! - Legacy (`[DONE]`, `{content}`) and current (`{type, data}`) event formats
//!
//! ## Architecture
//!
//! The library uses a two-tier API design:
//!
//! 1. **Static methods** for full control with explicit options
//! 2. **Instance methods** for convenience with stored default options
//!
//! Every event payload is classified once by [`frame::Frame::parse`]; the
//! [`stream`] module turns frames into [`stream::StreamEvent`]s and
//! [`dispatch`] forwards them to a [`dispatch::ChatHandler`].
//!
//! ## Example
//! ```no_run
//! use chatwire::client::{Client, StreamingClient};
//! use chatwire::dispatch::Callbacks;
//! use chatwire::model::ChatRequest;
//! use chatwire::options::{HttpTransport, TransportOptions};
//! use chatwire::ChatClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ChatClient::new(TransportOptions::new(HttpTransport::new(
//!         "http://localhost:8080",
//!     )));
//!
//!     for id in client.list_sessions().await? {
//!         println!("{id}: {} messages", client.history(&id).await?.len());
//!     }
//!
//!     let handle = client.send_chat_message(
//!         ChatRequest::new("chat-1", "How is BTC doing today?"),
//!         Callbacks::new(
//!             |message| println!("{}", message.content),
//!             |error| eprintln!("error: {error}"),
//!             || println!("done"),
//!         ),
//!     );
//!     handle.join().await;
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod client;
pub mod dispatch;
pub mod frame;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use chat::ChatClient;
pub use client::{Client, ClientError, StreamingClient};
pub use dispatch::{AbortHandle, Callbacks, ChatHandler};
pub use model::{ChatMessage, ChatRequest, HistoryMessage, SessionId};
pub use stream::{ChatStream, StreamEvent};
