//! Chatflow core - streaming wire protocol and shared types
//!
//! This crate provides:
//! - The frame types and encoder for the SSE-style wire protocol
//! - An incremental parser that recovers frames from a byte stream
//! - Request/response types shared by the server and the client

pub mod frame;
pub mod request;

pub use frame::{DONE_MARKER, Frame, FrameParser, ParsedFrame};
pub use request::{ChatRequest, ChatResponse, HistoryTurn, TurnRole};
