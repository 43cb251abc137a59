//! Chatflow server - dual-path streaming chat delivery
//!
//! This crate provides:
//! - The stream framer that serializes model output into the wire protocol
//! - Dual-mode delivery (incremental flush vs. buffered) behind one contract
//! - The chat pipeline: TTL-cached lookups, prompt assembly, model invocation
//! - Collaborator traits for config, knowledge retrieval and the model

pub mod api;
pub mod cache;
pub mod context;
pub mod delivery;
pub mod error;
pub mod framer;
pub mod providers;
pub mod service;
pub mod settings;

pub use api::{AppState, router};
pub use cache::TtlCache;
pub use context::PromptBuilder;
pub use delivery::DeliveryMode;
pub use error::{Result, ServerError};
pub use framer::{FramerOptions, frame_stream};
pub use providers::{
    ConfigStore, KnowledgeRetriever, MockConfigStore, MockModel, MockReplyStep, MockRetriever,
    ModelClient, TenantConfig, TokenStream,
};
pub use service::ChatPipeline;
pub use settings::Settings;
