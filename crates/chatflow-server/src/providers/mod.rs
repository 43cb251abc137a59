//! Collaborator interfaces: tenant configuration, knowledge retrieval
//! and model invocation.
//!
//! These are the boundaries of the delivery pipeline. Real deployments
//! plug provider-backed implementations in; the scripted mocks in this
//! module drive tests and local runs.

mod mock;

pub use mock::{MockConfigStore, MockModel, MockReplyStep, MockRetriever};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tenant-scoped presentation settings returned by the config store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_hash: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone_directive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_contact: Option<String>,
}

impl TenantConfig {
    pub fn new(tenant_hash: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            tenant_hash: tenant_hash.into(),
            display_name: display_name.into(),
            tone_directive: None,
            handoff_contact: None,
        }
    }

    pub fn with_tone(mut self, directive: impl Into<String>) -> Self {
        self.tone_directive = Some(directive.into());
        self
    }

    pub fn with_handoff_contact(mut self, contact: impl Into<String>) -> Self {
        self.handoff_contact = Some(contact.into());
        self
    }
}

/// Async sequence of reply text deltas, terminated by stream end or an
/// error item.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Configuration lookup by tenant key.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn fetch(&self, tenant_hash: &str) -> Result<TenantConfig>;
}

/// Knowledge-context lookup by query text.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>>;
}

/// Generative model invocation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model name, for logging.
    fn model(&self) -> &str;

    /// Stream reply deltas for a prompt.
    fn stream_reply(&self, prompt: &str) -> TokenStream;

    /// Produce the complete reply in one call (non-streaming path).
    async fn complete_reply(&self, prompt: &str) -> Result<String>;
}
