//! The stream consumer: issues the streaming request, parses frames
//! incrementally, enforces the first-byte deadline, and takes the
//! fallback path at most once per turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;

use chatflow_core::{ChatRequest, FrameParser, ParsedFrame};

use crate::error::{ClientError, Result};
use crate::fallback::request_fallback;
use crate::message::ChatMessage;
use crate::registry::StreamingRegistry;

const DEFAULT_FIRST_BYTE_DEADLINE_MS: u64 = 500;

/// Text shown when both streaming and the fallback path have failed.
pub const RETRYABLE_ERROR_TEXT: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// Endpoint and timing configuration for a chat client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub stream_url: String,
    pub chat_url: String,
    /// Maximum wait for the first streamed byte. Generation time after
    /// that is unbounded; the server heartbeat keeps the connection
    /// alive.
    pub first_byte_deadline: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            stream_url: format!("{base}/api/chat/stream"),
            chat_url: format!("{base}/api/chat"),
            first_byte_deadline: Duration::from_millis(DEFAULT_FIRST_BYTE_DEADLINE_MS),
        }
    }

    pub fn with_first_byte_deadline(mut self, deadline: Duration) -> Self {
        self.first_byte_deadline = deadline;
        self
    }
}

/// Issues streaming chat requests and drives each turn to a finalized
/// message.
pub struct ChatClient {
    http: reqwest::Client,
    config: ClientConfig,
    registry: Arc<StreamingRegistry>,
}

impl ChatClient {
    pub fn new(config: ClientConfig, registry: Arc<StreamingRegistry>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            registry,
        }
    }

    pub fn registry(&self) -> Arc<StreamingRegistry> {
        self.registry.clone()
    }

    /// Send one user turn and drive it to completion.
    ///
    /// A new call for the same conversation slot supersedes any prior
    /// in-flight turn: the old stream is simply abandoned, and its
    /// registry writes become no-ops once its id has been completed.
    pub async fn send_message(&self, request: ChatRequest) -> ChatMessage {
        let stream_id = uuid::Uuid::new_v4().to_string();
        let mut message = ChatMessage::streaming(stream_id.clone());
        self.registry.create_stream(&stream_id);

        match self
            .consume_stream(&request, &stream_id, &mut message)
            .await
        {
            Ok(()) => {
                let accumulated = self.registry.complete(&stream_id).unwrap_or_default();
                message.finalize(accumulated);
            }
            Err(e) => {
                tracing::warn!(stream_id = %stream_id, error = %e, "Streaming failed, taking fallback path");
                message.telemetry.fell_back = true;
                // Frames for this id stop mattering here.
                self.registry.complete(&stream_id);

                match request_fallback(&self.http, &self.config.chat_url, &request).await {
                    Ok(content) => message.finalize(content),
                    Err(fallback_error) => {
                        tracing::error!(error = %fallback_error, "Fallback failed, surfacing terminal error");
                        message.fail(RETRYABLE_ERROR_TEXT);
                    }
                }
            }
        }

        message
    }

    async fn consume_stream(
        &self,
        request: &ChatRequest,
        stream_id: &str,
        message: &mut ChatMessage,
    ) -> Result<()> {
        // The deadline covers everything up to the first byte of the
        // body: connection, response headers, first chunk. Returning
        // early drops the in-flight request, aborting it.
        let deadline = self.config.first_byte_deadline;
        let issued_at = Instant::now();

        let response = tokio::time::timeout(
            deadline,
            self.http.post(&self.config.stream_url).json(request).send(),
        )
        .await
        .map_err(|_| ClientError::FirstByteTimeout)?
        .map_err(|e| ClientError::StreamTransport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::StreamTransport(format!(
                "streaming endpoint returned {}",
                response.status()
            )));
        }

        let mut body = response.bytes_stream();

        let remaining = deadline.saturating_sub(issued_at.elapsed());
        let first = match tokio::time::timeout(remaining, body.next()).await {
            Err(_) => return Err(ClientError::FirstByteTimeout),
            Ok(None) => {
                return Err(ClientError::StreamTransport(
                    "stream closed before any byte arrived".to_string(),
                ));
            }
            Ok(Some(Err(e))) => return Err(ClientError::StreamTransport(e.to_string())),
            Ok(Some(Ok(bytes))) => bytes,
        };
        message.telemetry.first_chunk_ms = Some(message.telemetry.elapsed_ms());

        let mut parser = FrameParser::new();
        let frames = parser.push(&String::from_utf8_lossy(&first));
        if self.apply_frames(frames, stream_id, message)? {
            return Ok(());
        }

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ClientError::StreamTransport(e.to_string()))?;
            let frames = parser.push(&String::from_utf8_lossy(&chunk));
            if self.apply_frames(frames, stream_id, message)? {
                return Ok(());
            }
        }

        // Stream ended without the terminal marker; drain the parser in
        // case [DONE] arrived without its trailing blank line.
        if self.apply_frames(parser.finish(), stream_id, message)? {
            return Ok(());
        }
        Err(ClientError::StreamTransport(
            "stream ended without terminal marker".to_string(),
        ))
    }

    /// Apply parsed frames in arrival order. Returns true once the
    /// terminal marker has been seen.
    fn apply_frames(
        &self,
        frames: Vec<ParsedFrame>,
        stream_id: &str,
        message: &mut ChatMessage,
    ) -> Result<bool> {
        for frame in frames {
            match frame {
                ParsedFrame::Text { content, .. } => {
                    message.telemetry.total_chunks += 1;
                    self.registry.append(stream_id, &content);
                }
                ParsedFrame::Error { message: error } => {
                    return Err(ClientError::ErrorFrame(error));
                }
                ParsedFrame::Done => return Ok(true),
                ParsedFrame::Note { name, value_ms } => {
                    tracing::debug!(name = %name, value_ms, "Server timing note");
                }
                ParsedFrame::Comment => {}
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_joins_endpoint_paths() {
        let config = ClientConfig::new("http://localhost:3000/");
        assert_eq!(config.stream_url, "http://localhost:3000/api/chat/stream");
        assert_eq!(config.chat_url, "http://localhost:3000/api/chat");
        assert_eq!(config.first_byte_deadline, Duration::from_millis(500));
    }

    #[test]
    fn deadline_is_configurable() {
        let config =
            ClientConfig::new("http://localhost:3000").with_first_byte_deadline(Duration::from_millis(50));
        assert_eq!(config.first_byte_deadline, Duration::from_millis(50));
    }
}
