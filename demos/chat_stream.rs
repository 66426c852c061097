//! Streaming chat example.
//!
//! Run with:
//! ```bash
//! export CHAT_BASE_URL="http://localhost:8080"
//! cargo run --example chat_stream -- "How is BTC doing today?"
//! ```

use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use chatwire::client::{Client, StreamingClient};
use chatwire::model::{ChatRequest, SessionId};
use chatwire::stream::StreamEvent;
use chatwire::ChatClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for logging, RUST_LOG=chatwire=debug for frame traces
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What happened in the market today?".to_string());

    let client = ChatClient::from_env()?;

    // Show the sessions the backend already knows about
    let sessions = client.list_sessions().await?;
    println!("=== {} known sessions ===", sessions.len());
    for id in &sessions {
        let history = client.history(id).await?;
        println!("{}: {} messages", id, history.len());
    }

    let session_id = sessions
        .first()
        .cloned()
        .unwrap_or_else(|| SessionId::new("demo-session"));

    println!("\nStreaming answer for {}...\n", session_id);

    let mut stream = client
        .chat_stream(ChatRequest::new(session_id, message))
        .await?;

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Message(message) => {
                match message.text() {
                    Some(text) => print!("{}", text),
                    None => print!("{}", message.content),
                }

                // Flush stdout to show text immediately
                use std::io::Write;
                std::io::stdout().flush()?;
            }
            StreamEvent::Error(e) => {
                eprintln!("\nError in stream: {}", e);
                return Err(e.into());
            }
            StreamEvent::Complete => {
                println!("\n\n=== Stream Complete ===");
            }
        }
    }

    Ok(())
}
