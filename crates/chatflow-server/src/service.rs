//! The chat pipeline: cached lookups, prompt assembly, model invocation.

use std::sync::Arc;

use futures::stream::BoxStream;

use chatflow_core::{ChatRequest, ChatResponse, Frame};

use crate::cache::TtlCache;
use crate::context::PromptBuilder;
use crate::error::Result;
use crate::framer::{FramerOptions, frame_stream};
use crate::providers::{ConfigStore, KnowledgeRetriever, ModelClient, TenantConfig};
use crate::settings::Settings;

/// Orchestrates one chat turn end to end, in either delivery mode.
///
/// The two TTL caches are the only state shared across requests.
pub struct ChatPipeline {
    config_store: Arc<dyn ConfigStore>,
    retriever: Arc<dyn KnowledgeRetriever>,
    model: Arc<dyn ModelClient>,
    config_cache: TtlCache<String, TenantConfig>,
    knowledge_cache: TtlCache<String, Vec<String>>,
}

impl ChatPipeline {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        retriever: Arc<dyn KnowledgeRetriever>,
        model: Arc<dyn ModelClient>,
        settings: &Settings,
    ) -> Self {
        Self {
            config_store,
            retriever,
            model,
            config_cache: TtlCache::new(settings.config_cache_ttl, settings.cache_capacity),
            knowledge_cache: TtlCache::new(settings.knowledge_cache_ttl, settings.cache_capacity),
        }
    }

    async fn tenant_config(&self, tenant_hash: &str) -> Result<TenantConfig> {
        if let Some(config) = self.config_cache.get(&tenant_hash.to_string()).await {
            tracing::debug!(tenant_hash, "Config cache hit");
            return Ok(config);
        }
        let config = self.config_store.fetch(tenant_hash).await?;
        self.config_cache
            .put(tenant_hash.to_string(), config.clone())
            .await;
        Ok(config)
    }

    /// Knowledge lookup keyed by the normalized query. A retrieval
    /// failure degrades to an empty context rather than failing the
    /// turn; the prompt then carries the no-information clause.
    async fn knowledge_for(&self, query: &str) -> Vec<String> {
        let key = query.trim().to_lowercase();
        if let Some(chunks) = self.knowledge_cache.get(&key).await {
            tracing::debug!(query = %key, "Knowledge cache hit");
            return chunks;
        }
        match self.retriever.retrieve(query).await {
            Ok(chunks) => {
                self.knowledge_cache.put(key, chunks.clone()).await;
                chunks
            }
            Err(e) => {
                tracing::warn!(error = %e, "Knowledge retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    async fn assemble(&self, request: &ChatRequest) -> Result<(String, Vec<String>)> {
        let config = self.tenant_config(&request.tenant_hash).await?;
        let knowledge = self.knowledge_for(&request.user_input).await;
        let prompt = PromptBuilder::new(&config, &request.user_input)
            .with_history(request.conversation_history.clone())
            .with_knowledge(knowledge.clone())
            .build();
        Ok((prompt, knowledge))
    }

    /// Run one streaming turn: assemble the prompt, invoke the model,
    /// and frame its token stream.
    pub async fn stream_turn(
        &self,
        request: &ChatRequest,
        opts: FramerOptions,
    ) -> Result<BoxStream<'static, Frame>> {
        let (prompt, _) = self.assemble(request).await?;
        tracing::debug!(
            session_id = %request.session_id,
            model = self.model.model(),
            "Invoking model for streaming turn"
        );
        let tokens = self.model.stream_reply(&prompt);
        Ok(Box::pin(frame_stream(
            tokens,
            request.session_id.clone(),
            opts,
        )))
    }

    /// Run one complete-response turn (the fallback endpoint).
    pub async fn complete_turn(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let (prompt, sources) = self.assemble(request).await?;
        tracing::debug!(
            session_id = %request.session_id,
            model = self.model.model(),
            "Invoking model for complete turn"
        );
        let content = self.model.complete_reply(&prompt).await?;
        Ok(ChatResponse {
            content,
            session_id: request.session_id.clone(),
            sources,
        })
    }
}
