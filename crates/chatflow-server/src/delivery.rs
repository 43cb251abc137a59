//! Dual-mode frame delivery.
//!
//! Some runtimes can flush bytes to the client as they are produced;
//! others can only return one complete payload. Both strategies encode
//! through the same `Frame::encode`, so the byte sequence is identical
//! either way; only when the bytes become visible differs.

use std::convert::Infallible;
use std::str::FromStr;

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, header};
use axum::response::Response;
use futures::{Stream, StreamExt};

use chatflow_core::{Frame, frame::encode_frames};

/// Delivery capability, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Frames are flushed incrementally as the model produces tokens.
    Streaming,
    /// Frames are accumulated and returned as one complete payload.
    Buffered,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "streaming" => Ok(Self::Streaming),
            "buffered" => Ok(Self::Buffered),
            other => Err(format!("Unknown delivery mode: {}", other)),
        }
    }
}

/// Build the HTTP response for a framed stream under the given mode.
pub async fn respond(
    mode: DeliveryMode,
    frames: impl Stream<Item = Frame> + Send + 'static,
) -> Response {
    match mode {
        DeliveryMode::Streaming => streaming_response(frames),
        DeliveryMode::Buffered => buffered_response(frames).await,
    }
}

fn event_stream_headers(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
}

fn streaming_response(frames: impl Stream<Item = Frame> + Send + 'static) -> Response {
    let bytes = frames.map(|frame| Ok::<_, Infallible>(Bytes::from(frame.encode())));
    let mut response = Response::new(Body::from_stream(bytes));
    event_stream_headers(&mut response);
    response
}

async fn buffered_response(frames: impl Stream<Item = Frame> + Send + 'static) -> Response {
    let frames: Vec<Frame> = frames.collect().await;
    let mut response = Response::new(Body::from(encode_frames(&frames)));
    event_stream_headers(&mut response);
    response
}
