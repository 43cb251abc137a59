//! Consumer behavior against a mocked HTTP surface: framing, deadline,
//! fallback policy, envelope unwrapping.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatflow_client::{
    ChatClient, ChatRequest, ClientConfig, RETRYABLE_ERROR_TEXT, StreamUpdate, StreamingRegistry,
};
use chatflow_core::{Frame, frame::encode_frames};

fn wire(frames: &[Frame]) -> String {
    encode_frames(frames)
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

async fn mount_stream(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_fallback(server: &MockServer, template: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

fn client(server: &MockServer, deadline: Duration) -> (ChatClient, Arc<StreamingRegistry>) {
    let registry = Arc::new(StreamingRegistry::new());
    let config = ClientConfig::new(&server.uri()).with_first_byte_deadline(deadline);
    (ChatClient::new(config, registry.clone()), registry)
}

fn request() -> ChatRequest {
    ChatRequest::new("t-1", "s-1", "hi")
}

#[tokio::test]
async fn streamed_turn_renders_and_finalizes() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(wire(&[
            Frame::Prelude,
            Frame::note("first-token-ms", 12),
            Frame::text("Hello", "s-1"),
            Frame::Heartbeat,
            Frame::text(" world", "s-1"),
            Frame::Done,
        ])),
    )
    .await;
    mount_fallback(&server, ResponseTemplate::new(200), 0).await;

    let (client, registry) = client(&server, Duration::from_millis(500));

    let fragments = Arc::new(RwLock::new(Vec::new()));
    let sink = fragments.clone();
    registry.subscribe(move |update| {
        if let StreamUpdate::Appended { fragment, .. } = update {
            sink.write().push(fragment.clone());
        }
    });

    let message = client.send_message(request()).await;

    assert_eq!(message.content, "Hello world");
    assert!(!message.is_streaming);
    assert!(!message.is_error);
    assert!(!message.telemetry.fell_back);
    assert_eq!(message.telemetry.total_chunks, 2);
    assert!(message.telemetry.first_chunk_ms.is_some());

    // Renderers observed each fragment as it arrived.
    assert_eq!(
        *fragments.read(),
        vec!["Hello".to_string(), " world".to_string()]
    );

    // The StreamState is gone once the turn is finalized.
    let stream_id = message.stream_id.as_deref().unwrap();
    assert!(registry.snapshot(stream_id).is_none());
}

#[tokio::test]
async fn first_byte_deadline_triggers_fallback_once() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(wire(&[Frame::Prelude, Frame::text("late", "s-1"), Frame::Done]))
            .set_delay(Duration::from_millis(400)),
    )
    .await;
    mount_fallback(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"content": "Fallback answer", "session_id": "s-1"})),
        1,
    )
    .await;

    let (client, _registry) = client(&server, Duration::from_millis(50));
    let message = client.send_message(request()).await;

    assert_eq!(message.content, "Fallback answer");
    assert!(message.telemetry.fell_back);
    assert!(!message.is_error);
    assert!(!message.is_streaming);
}

#[tokio::test]
async fn error_frame_mid_stream_falls_back() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(wire(&[
            Frame::Prelude,
            Frame::text("partial", "s-1"),
            Frame::error("model unavailable"),
            Frame::Done,
        ])),
    )
    .await;
    mount_fallback(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"content": "Recovered", "session_id": "s-1"})),
        1,
    )
    .await;

    let (client, _registry) = client(&server, Duration::from_millis(500));
    let message = client.send_message(request()).await;

    assert_eq!(message.content, "Recovered");
    assert!(message.telemetry.fell_back);
    // The partial delta was applied before the error arrived.
    assert_eq!(message.telemetry.total_chunks, 1);
}

#[tokio::test]
async fn double_wrapped_fallback_body_unwraps() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(String::new()).set_delay(Duration::from_millis(400)),
    )
    .await;

    let inner = serde_json::json!({"content": "Fallback answer", "session_id": "s-1"}).to_string();
    let middle = serde_json::json!({ "body": inner }).to_string();
    mount_fallback(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "body": middle })),
        1,
    )
    .await;

    let (client, _registry) = client(&server, Duration::from_millis(50));
    let message = client.send_message(request()).await;

    assert_eq!(message.content, "Fallback answer");
    assert!(message.telemetry.fell_back);
}

#[tokio::test]
async fn second_failure_is_terminal_not_a_second_fallback() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(String::new()).set_delay(Duration::from_millis(400)),
    )
    .await;
    // A server-side failure is not network-class, so the fallback is
    // attempted exactly once.
    mount_fallback(&server, ResponseTemplate::new(500), 1).await;

    let (client, _registry) = client(&server, Duration::from_millis(50));
    let message = client.send_message(request()).await;

    assert!(message.is_error);
    assert_eq!(message.content, RETRYABLE_ERROR_TEXT);
    assert!(message.telemetry.fell_back);
    assert!(!message.is_streaming);
}

#[tokio::test]
async fn malformed_lines_are_skipped_not_fatal() {
    let server = MockServer::start().await;
    let mut body = wire(&[Frame::Prelude]);
    body.push_str("data: {definitely not json}\n\n");
    body.push_str(&wire(&[Frame::text("ok", "s-1"), Frame::Done]));
    mount_stream(&server, sse_response(body)).await;
    mount_fallback(&server, ResponseTemplate::new(200), 0).await;

    let (client, _registry) = client(&server, Duration::from_millis(500));
    let message = client.send_message(request()).await;

    assert_eq!(message.content, "ok");
    assert!(!message.telemetry.fell_back);
}

#[tokio::test]
async fn heartbeat_only_preamble_does_not_fall_back() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(wire(&[
            Frame::Prelude,
            Frame::Heartbeat,
            Frame::Heartbeat,
            Frame::Heartbeat,
            Frame::text("eventually", "s-1"),
            Frame::Done,
        ])),
    )
    .await;
    mount_fallback(&server, ResponseTemplate::new(200), 0).await;

    let (client, _registry) = client(&server, Duration::from_millis(500));
    let message = client.send_message(request()).await;

    assert_eq!(message.content, "eventually");
    assert!(!message.telemetry.fell_back);
}

#[tokio::test]
async fn stream_ending_without_done_falls_back() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        sse_response(wire(&[Frame::Prelude, Frame::text("cut off", "s-1")])),
    )
    .await;
    mount_fallback(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"content": "Recovered", "session_id": "s-1"})),
        1,
    )
    .await;

    let (client, _registry) = client(&server, Duration::from_millis(500));
    let message = client.send_message(request()).await;

    assert_eq!(message.content, "Recovered");
    assert!(message.telemetry.fell_back);
}
