//! Chatflow client - streaming consumer with automatic degradation
//!
//! This crate provides:
//! - The stream consumer: first-byte deadline, incremental frame
//!   parsing, single-fallback-per-turn policy
//! - The streaming registry decoupling network arrival from rendering
//! - The complete-response fallback path with bounded envelope
//!   unwrapping

pub mod consumer;
pub mod error;
mod fallback;
pub mod message;
pub mod registry;

pub use chatflow_core::{ChatRequest, HistoryTurn, TurnRole};
pub use consumer::{ChatClient, ClientConfig, RETRYABLE_ERROR_TEXT};
pub use error::{ClientError, Result};
pub use message::{ChatMessage, MessageRole, TurnTelemetry};
pub use registry::{StreamState, StreamUpdate, StreamingRegistry};
