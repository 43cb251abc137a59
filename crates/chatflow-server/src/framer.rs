//! Stream framer: serializes model output into the wire protocol.
//!
//! Contract:
//! - The prelude is the first frame, before any data exists.
//! - `x-first-token-ms` is emitted immediately before the first delta.
//! - Heartbeats interleave on a fixed interval while the model is idle.
//! - Every path ends with exactly one `Done`, after an `ErrorFrame` and
//!   the trailing timing notes where applicable. The heartbeat interval
//!   is owned by the stream and released when it is dropped.

use std::time::Instant;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::time::MissedTickBehavior;

use chatflow_core::Frame;

use crate::providers::TokenStream;

/// Timing and heartbeat options for one framed stream.
#[derive(Debug, Clone)]
pub struct FramerOptions {
    pub heartbeat_interval: std::time::Duration,
    /// Request arrival time; timing notes are relative to this.
    pub started_at: Instant,
}

impl FramerOptions {
    pub fn new(heartbeat_interval: std::time::Duration) -> Self {
        Self {
            heartbeat_interval,
            started_at: Instant::now(),
        }
    }
}

/// Frame a model token stream for one session.
pub fn frame_stream(
    mut tokens: TokenStream,
    session_id: String,
    opts: FramerOptions,
) -> impl Stream<Item = Frame> + Send {
    stream! {
        yield Frame::Prelude;

        let mut heartbeat = tokio::time::interval(opts.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first
        // heartbeat fires one full interval after the prelude.
        heartbeat.tick().await;

        let mut saw_first_token = false;
        let mut total_tokens: u64 = 0;
        let mut error: Option<String> = None;

        loop {
            tokio::select! {
                token = tokens.next() => {
                    match token {
                        Some(Ok(delta)) => {
                            if !saw_first_token {
                                saw_first_token = true;
                                yield Frame::note(
                                    "first-token-ms",
                                    opts.started_at.elapsed().as_millis() as u64,
                                );
                            }
                            total_tokens += 1;
                            yield Frame::text(delta, session_id.clone());
                        }
                        Some(Err(e)) => {
                            error = Some(e.to_string());
                            break;
                        }
                        None => break,
                    }
                }
                _ = heartbeat.tick() => {
                    yield Frame::Heartbeat;
                }
            }
        }

        if let Some(message) = error {
            tracing::warn!(session_id = %session_id, error = %message, "Model stream failed");
            yield Frame::error(message);
        }
        yield Frame::note("total-tokens", total_tokens);
        yield Frame::note("total-time-ms", opts.started_at.elapsed().as_millis() as u64);
        yield Frame::Done;
    }
}
