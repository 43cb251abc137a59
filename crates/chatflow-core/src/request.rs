//! Request and response types shared by the server and the client.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryTurn {
    pub role: TurnRole,
    pub content: String,
}

impl HistoryTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Body of both the streaming and the fallback chat request.
/// Immutable once issued; one per user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub tenant_hash: String,
    pub session_id: String,
    pub user_input: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryTurn>,
}

impl ChatRequest {
    /// Create a request with no prior history
    pub fn new(
        tenant_hash: impl Into<String>,
        session_id: impl Into<String>,
        user_input: impl Into<String>,
    ) -> Self {
        Self {
            tenant_hash: tenant_hash.into(),
            session_id: session_id.into(),
            user_input: user_input.into(),
            conversation_history: Vec::new(),
        }
    }

    /// Attach conversation history
    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.conversation_history = history;
        self
    }
}

/// Complete-response body returned by the non-streaming chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}
