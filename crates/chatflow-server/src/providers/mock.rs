//! Deterministic scripted collaborators for tests and local runs.

use std::collections::HashMap;

use async_stream::stream;
use async_trait::async_trait;
use tokio::time::{Duration, sleep};

use crate::error::{Result, ServerError};

use super::{ConfigStore, KnowledgeRetriever, ModelClient, TenantConfig, TokenStream};

/// One scripted step of a mock model reply.
#[derive(Debug, Clone)]
pub enum MockReplyStep {
    /// Emit a text delta.
    Text(String),
    /// Pause before the next step.
    Delay(u64),
    /// Fail the stream at this point.
    Error(String),
}

impl MockReplyStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn delay(ms: u64) -> Self {
        Self::Delay(ms)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

/// A mock model that replays the same script on every invocation.
#[derive(Debug, Clone, Default)]
pub struct MockModel {
    model: String,
    script: Vec<MockReplyStep>,
}

impl MockModel {
    pub fn new(model: impl Into<String>, script: Vec<MockReplyStep>) -> Self {
        Self {
            model: model.into(),
            script,
        }
    }

    /// Convenience constructor for a plain sequence of text deltas.
    pub fn from_deltas(model: impl Into<String>, deltas: &[&str]) -> Self {
        Self::new(
            model,
            deltas.iter().map(|d| MockReplyStep::text(*d)).collect(),
        )
    }
}

#[async_trait]
impl ModelClient for MockModel {
    fn model(&self) -> &str {
        &self.model
    }

    fn stream_reply(&self, _prompt: &str) -> TokenStream {
        let script = self.script.clone();
        Box::pin(stream! {
            for step in script {
                match step {
                    MockReplyStep::Text(content) => yield Ok(content),
                    MockReplyStep::Delay(ms) => sleep(Duration::from_millis(ms)).await,
                    MockReplyStep::Error(message) => {
                        yield Err(ServerError::Model(message));
                        return;
                    }
                }
            }
        })
    }

    async fn complete_reply(&self, _prompt: &str) -> Result<String> {
        let mut reply = String::new();
        for step in &self.script {
            match step {
                MockReplyStep::Text(content) => reply.push_str(content),
                MockReplyStep::Delay(_) => {}
                MockReplyStep::Error(message) => {
                    return Err(ServerError::Model(message.clone()));
                }
            }
        }
        Ok(reply)
    }
}

/// In-memory config store with a default config for unknown tenants.
#[derive(Debug, Clone)]
pub struct MockConfigStore {
    configs: HashMap<String, TenantConfig>,
    default_config: TenantConfig,
}

impl MockConfigStore {
    pub fn new(default_config: TenantConfig) -> Self {
        Self {
            configs: HashMap::new(),
            default_config,
        }
    }

    pub fn with_config(mut self, config: TenantConfig) -> Self {
        self.configs.insert(config.tenant_hash.clone(), config);
        self
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn fetch(&self, tenant_hash: &str) -> Result<TenantConfig> {
        Ok(self
            .configs
            .get(tenant_hash)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone()))
    }
}

/// In-memory retriever returning a fixed chunk list.
#[derive(Debug, Clone, Default)]
pub struct MockRetriever {
    chunks: Vec<String>,
}

impl MockRetriever {
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    /// A retriever that never finds anything.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeRetriever for MockRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<String>> {
        Ok(self.chunks.clone())
    }
}
