//! Frame types and wire encoding for the streaming protocol.
//!
//! Contract:
//! - Every encoded frame is a complete unit terminated by a blank line.
//! - A stream ends with exactly one `Done` frame, and nothing follows it.
//! - Comment frames (prelude, heartbeat, timing notes) carry no payload
//!   and may be ignored by consumers that only want text.

use serde::{Deserialize, Serialize};

/// Literal terminal marker carried in the final `data:` line.
pub const DONE_MARKER: &str = "[DONE]";

/// One self-contained unit of the streaming wire protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Opening comment, sent before any data exists to keep the
    /// transport open.
    Prelude,
    /// Periodic no-op comment sent while the model is idle.
    Heartbeat,
    /// Comment-style instrumentation (`x-first-token-ms` etc).
    /// `x-total-tokens` reuses the value slot for a count.
    TimingNote { name: String, value_ms: u64 },
    /// Incremental model output.
    TextDelta { content: String, session_id: String },
    /// Server-side failure surfaced to the client.
    ErrorFrame { message: String },
    /// Terminal marker. Exactly one per stream, always last.
    Done,
}

/// JSON payload carried by `data:` lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
enum DataPayload {
    Text { content: String, session_id: String },
    Error { error: String },
}

impl Frame {
    /// Create a text delta frame.
    pub fn text(content: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::TextDelta {
            content: content.into(),
            session_id: session_id.into(),
        }
    }

    /// Create a timing note frame.
    pub fn note(name: impl Into<String>, value_ms: u64) -> Self {
        Self::TimingNote {
            name: name.into(),
            value_ms,
        }
    }

    /// Create an error frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorFrame {
            message: message.into(),
        }
    }

    /// Encode this frame into its wire form, trailing blank line included.
    pub fn encode(&self) -> String {
        match self {
            Self::Prelude => ":ok\n\n".to_string(),
            Self::Heartbeat => ": heartbeat\n\n".to_string(),
            Self::TimingNote { name, value_ms } => {
                format!(": x-{}={}\n\n", name, value_ms)
            }
            Self::TextDelta {
                content,
                session_id,
            } => {
                let payload = DataPayload::Text {
                    content: content.clone(),
                    session_id: session_id.clone(),
                };
                format!(
                    "data: {}\n\n",
                    serde_json::to_string(&payload).unwrap_or_default()
                )
            }
            Self::ErrorFrame { message } => {
                let payload = DataPayload::Error {
                    error: message.clone(),
                };
                format!(
                    "data: {}\n\n",
                    serde_json::to_string(&payload).unwrap_or_default()
                )
            }
            Self::Done => format!("data: {}\n\n", DONE_MARKER),
        }
    }
}

/// Encode a full frame sequence into one payload (buffered delivery).
pub fn encode_frames<'a>(frames: impl IntoIterator<Item = &'a Frame>) -> String {
    frames.into_iter().map(Frame::encode).collect()
}

/// A frame as recovered by the client-side parser.
///
/// Comment frames collapse into `Comment`; timing notes keep their
/// name/value so consumers can pick up server-side instrumentation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFrame {
    Text { content: String, session_id: String },
    Error { message: String },
    Note { name: String, value_ms: u64 },
    Comment,
    Done,
}

/// Incremental frame parser.
///
/// Feed raw chunks as they arrive; complete frames are returned as soon
/// as their terminating blank line has been seen. Partial lines are
/// buffered across read boundaries. Unparseable `data:` lines are
/// skipped and counted, never fatal.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: String,
    skipped: u64,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    /// Feed a chunk of the response body, returning all frames whose
    /// terminating blank line arrived with it.
    pub fn push(&mut self, chunk: &str) -> Vec<ParsedFrame> {
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let event = self.buffer[..pos].to_string();
            self.buffer = self.buffer[pos + 2..].to_string();
            for line in event.lines() {
                if let Some(frame) = self.parse_line(line) {
                    frames.push(frame);
                }
            }
        }
        frames
    }

    /// Drain whatever remains in the buffer after the stream ends.
    ///
    /// Handles the case where the last frame lacks its trailing blank
    /// line, e.g. after a network interruption.
    pub fn finish(&mut self) -> Vec<ParsedFrame> {
        let remaining = std::mem::take(&mut self.buffer);
        remaining
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&mut self, line: &str) -> Option<ParsedFrame> {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return None;
        }

        if let Some(data) = line.strip_prefix("data: ") {
            let data = data.trim();
            if data == DONE_MARKER {
                return Some(ParsedFrame::Done);
            }
            return match serde_json::from_str::<DataPayload>(data) {
                Ok(DataPayload::Text {
                    content,
                    session_id,
                }) => Some(ParsedFrame::Text {
                    content,
                    session_id,
                }),
                Ok(DataPayload::Error { error }) => Some(ParsedFrame::Error { message: error }),
                Err(e) => {
                    self.skipped += 1;
                    tracing::debug!(error = %e, "Skipping unparseable data line");
                    None
                }
            };
        }

        if let Some(comment) = line.strip_prefix(':') {
            let comment = comment.trim();
            if let Some(note) = comment.strip_prefix("x-")
                && let Some((name, value)) = note.split_once('=')
                && let Ok(value_ms) = value.trim().parse::<u64>()
            {
                return Some(ParsedFrame::Note {
                    name: name.to_string(),
                    value_ms,
                });
            }
            return Some(ParsedFrame::Comment);
        }

        self.skipped += 1;
        tracing::debug!(line, "Skipping unrecognized stream line");
        None
    }
}
