//! The rendered chat entry for one turn, with its telemetry.

use std::time::Instant;

/// Who a rendered message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// Diagnostics accumulated over the lifetime of one turn. Attached to
/// the finalized message, never persisted beyond the session.
#[derive(Debug, Clone)]
pub struct TurnTelemetry {
    /// Time to the first streamed chunk, if streaming got that far.
    pub first_chunk_ms: Option<u64>,
    pub total_chunks: u32,
    pub fell_back: bool,
    pub started_at: Instant,
}

impl TurnTelemetry {
    pub(crate) fn start() -> Self {
        Self {
            first_chunk_ms: None,
            total_chunks: 0,
            fell_back: false,
            started_at: Instant::now(),
        }
    }

    /// Total turn duration so far, in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// One rendered chat entry. Mutated in place while fragments arrive,
/// frozen on finalize or fallback completion.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub is_streaming: bool,
    pub stream_id: Option<String>,
    pub is_error: bool,
    pub telemetry: TurnTelemetry,
}

impl ChatMessage {
    /// Create the assistant message for a turn that is about to stream.
    pub fn streaming(stream_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: String::new(),
            is_streaming: true,
            stream_id: Some(stream_id.into()),
            is_error: false,
            telemetry: TurnTelemetry::start(),
        }
    }

    /// Freeze the message with its final content.
    pub(crate) fn finalize(&mut self, content: String) {
        self.content = content;
        self.is_streaming = false;
    }

    /// Freeze the message as a user-visible, retryable error.
    pub(crate) fn fail(&mut self, text: impl Into<String>) {
        self.content = text.into();
        self.is_streaming = false;
        self.is_error = true;
    }
}
