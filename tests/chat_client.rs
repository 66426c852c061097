//! End-to-end tests of `ChatClient` against an in-process backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};

use chatwire::model::Role;
use chatwire::options::{ChatEndpoints, HttpTransport, TransportOptions};
use chatwire::{
    Callbacks, ChatClient, ChatHandler, ChatMessage, ChatRequest, Client, ClientError, SessionId,
    StreamEvent, StreamingClient,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Message(Value),
    Error(Option<StatusCode>),
    Complete,
}

type Calls = Arc<Mutex<Vec<Call>>>;

fn recorder() -> (Calls, impl ChatHandler) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let (m, e, c) = (calls.clone(), calls.clone(), calls.clone());
    let handler = Callbacks::new(
        move |message: ChatMessage| m.lock().unwrap().push(Call::Message(message.content)),
        move |error: ClientError| e.lock().unwrap().push(Call::Error(error.status())),
        move || c.lock().unwrap().push(Call::Complete),
    );
    (calls, handler)
}

async fn serve(router: Router) -> ChatClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    ChatClient::new(
        TransportOptions::new(HttpTransport::new(format!("http://{addr}")))
            .with_timeout(Duration::from_secs(5)),
    )
}

fn event_stream(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/event-stream")], body)
}

async fn stream_calls(body: &'static str) -> Vec<Call> {
    let client = serve(Router::new().route(
        "/ai/chat",
        post(move || async move { event_stream(body) }),
    ))
    .await;
    let (calls, handler) = recorder();
    client
        .send_chat_message(ChatRequest::new("chat-1", "hi"), handler)
        .join()
        .await;
    let recorded = calls.lock().unwrap().clone();
    recorded
}

#[tokio::test]
async fn test_list_sessions_from_envelope() {
    let client = serve(Router::new().route(
        "/ai/history/getChatIds",
        get(|| async {
            Json(json!({"code": 200, "msg": "success", "data": {"chatIds": ["b", "a", "c"]}}))
        }),
    ))
    .await;

    let ids = client.list_sessions().await.unwrap();
    assert_eq!(
        ids,
        vec![SessionId::from("b"), SessionId::from("a"), SessionId::from("c")]
    );
}

#[tokio::test]
async fn test_history_is_returned_unmodified() {
    let client = serve(Router::new().route(
        "/ai/history/get/:chat_id",
        get(|Path(chat_id): Path<String>| async move {
            Json(json!([
                {"role": "user", "content": format!("question in {chat_id}")},
                {"role": "assistant", "content": "answer"},
                {"role": "user", "content": "follow-up"}
            ]))
        }),
    ))
    .await;

    let history = client.history(&SessionId::from("chat 7")).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content.as_deref(), Some("question in chat 7"));
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[2].content.as_deref(), Some("follow-up"));
}

#[tokio::test]
async fn test_history_http_failure_propagates() {
    let client = serve(Router::new().route(
        "/ai/history/get/:chat_id",
        get(|| async { (StatusCode::BAD_REQUEST, "unknown chat") }),
    ))
    .await;

    match client.history(&SessionId::from("x")).await {
        Err(ClientError::Rejected { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body, "unknown chat");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_final_then_done() {
    let calls = stream_calls(concat!(
        "data:{\"type\":\"final\",\"data\":\"hello\"}\n\n",
        "data:{\"type\":\"done\"}\n\n",
    ))
    .await;
    assert_eq!(calls, vec![Call::Message(json!("hello")), Call::Complete]);
}

#[tokio::test]
async fn test_full_workflow_stream() {
    let calls = stream_calls(concat!(
        "data:{\"type\":\"extract\",",
        "\"data\":{\"newsCategories\":[\"crypto\"],\"products\":[\"BTC-USDT\"]}}\n\n",
        "data:{\"type\":\"news\",\"data\":[{\"title\":\"t\",\"source\":\"s\",\"url\":\"u\"}]}\n\n",
        "data:{\"type\":\"market\",\"data\":[{\"symbol\":\"BTC-USDT\",\"high\":1.0}]}\n\n",
        "data:{\"type\":\"final\",\"data\":\"buy low\"}\n\n",
        "data:{\"type\":\"done\"}\n\n",
        "data:[DONE]\n\n",
    ))
    .await;
    assert_eq!(calls, vec![Call::Message(json!("buy low")), Call::Complete]);
}

#[tokio::test]
async fn test_nothing_after_legacy_done() {
    let calls = stream_calls(concat!(
        "data: [DONE]\n\n",
        "data: {\"content\":\"late\"}\n\n",
        "data: DONE\n\n",
    ))
    .await;
    assert_eq!(calls, vec![Call::Complete]);
}

#[tokio::test]
async fn test_market_frame_is_silent() {
    let calls = stream_calls(concat!(
        "data:{\"type\":\"market\",\"data\":{\"symbol\":\"ETH-USDT\"}}\n\n",
        "data:{\"type\":\"done\"}\n\n",
    ))
    .await;
    // the completion comes from the done frame alone
    assert_eq!(calls, vec![Call::Complete]);
}

#[tokio::test]
async fn test_plain_text_frame() {
    let calls = stream_calls("data: hello world\n\n").await;
    assert_eq!(
        calls,
        vec![Call::Message(json!("hello world")), Call::Complete]
    );
}

#[tokio::test]
async fn test_close_without_done_completes() {
    let calls = stream_calls("data: {\"content\":\"a\"}\n\ndata: {\"content\":\"b\"}\n\n").await;
    assert_eq!(
        calls,
        vec![
            Call::Message(json!("a")),
            Call::Message(json!("b")),
            Call::Complete
        ]
    );
}

#[tokio::test]
async fn test_not_found_is_single_error() {
    let client = serve(Router::new()).await;
    let (calls, handler) = recorder();
    client
        .send_chat_message(ChatRequest::new("chat-1", "hi"), handler)
        .join()
        .await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec![Call::Error(Some(StatusCode::NOT_FOUND))]
    );
}

#[tokio::test]
async fn test_server_error_is_single_error() {
    let client = serve(Router::new().route(
        "/ai/chat",
        post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;

    match client.chat_stream(ChatRequest::new("chat-1", "hi")).await {
        Err(error @ ClientError::Status { .. }) => assert!(error.is_retryable()),
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }

    let (calls, handler) = recorder();
    client
        .send_chat_message(ChatRequest::new("chat-1", "hi"), handler)
        .join()
        .await;
    assert_eq!(
        *calls.lock().unwrap(),
        vec![Call::Error(Some(StatusCode::SERVICE_UNAVAILABLE))]
    );
}

#[tokio::test]
async fn test_connection_lost_mid_stream() {
    let client = serve(Router::new().route(
        "/ai/chat",
        post(|| async {
            let body = futures::stream::unfold(0u8, |step| async move {
                match step {
                    0 => Some((Ok("data: {\"content\":\"a\"}\n\n"), 1)),
                    1 => {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        let reset =
                            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
                        Some((Err(reset), 2))
                    }
                    _ => None,
                }
            });
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(body),
            )
        }),
    ))
    .await;

    let (calls, handler) = recorder();
    tokio::time::timeout(
        Duration::from_secs(5),
        client
            .send_chat_message(ChatRequest::new("chat-1", "hi"), handler)
            .join(),
    )
    .await
    .expect("a broken body should end the stream");

    // the error is final, no completion follows it
    assert_eq!(
        *calls.lock().unwrap(),
        vec![Call::Message(json!("a")), Call::Error(None)]
    );
}

#[tokio::test]
async fn test_abort_before_first_frame() {
    let client = serve(Router::new().route(
        "/ai/chat",
        post(|| async {
            let body = futures::stream::once(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, std::io::Error>("data: too late\n\n")
            });
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(body),
            )
        }),
    ))
    .await;

    let (calls, handler) = recorder();
    let handle = client.send_chat_message(ChatRequest::new("chat-1", "hi"), handler);
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.abort();

    tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("abort should end the stream promptly");

    let calls = calls.lock().unwrap();
    assert!(!calls.iter().any(|c| matches!(c, Call::Message(_))));
    assert!(calls.iter().filter(|c| **c == Call::Complete).count() <= 1);
    assert!(!calls.iter().any(|c| matches!(c, Call::Error(_))));
}

type Captured = Arc<Mutex<Option<(Value, Option<String>)>>>;

async fn capture_chat(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *captured.lock().unwrap() = Some((body, accept));
    event_stream("data:{\"type\":\"done\"}\n\n")
}

#[tokio::test]
async fn test_request_body_and_headers() {
    let captured: Captured = Arc::new(Mutex::new(None));
    let client = serve(
        Router::new()
            .route("/ai/chat", post(capture_chat))
            .with_state(captured.clone()),
    )
    .await;

    let events: Vec<StreamEvent> = client
        .chat_stream(ChatRequest::new("chat-42", "what about ETH?"))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Complete));

    let (body, accept) = captured.lock().unwrap().clone().unwrap();
    assert_eq!(body, json!({"chatId": "chat-42", "message": "what about ETH?"}));
    assert_eq!(accept.as_deref(), Some("text/event-stream"));
}

#[tokio::test]
async fn test_workflow_endpoint() {
    let client = serve(Router::new().route(
        "/ai/workflow/chat",
        post(|| async {
            event_stream(concat!(
                "data:{\"type\":\"final\",\"data\":\"via workflow\"}\n\n",
                "data:[DONE]\n\n",
            ))
        }),
    ))
    .await;

    let options = client.transport_options().clone();
    let client = ChatClient::new(TransportOptions {
        provider: options.provider.with_endpoints(ChatEndpoints::workflow()),
        ..options
    });

    let (calls, handler) = recorder();
    client
        .send_chat_message(ChatRequest::new("chat-1", "hi"), handler)
        .join()
        .await;
    assert_eq!(
        *calls.lock().unwrap(),
        vec![Call::Message(json!("via workflow")), Call::Complete]
    );
}
