//! Prompt assembly from tenant config, knowledge context and history.

use chatflow_core::{HistoryTurn, TurnRole};

use crate::providers::TenantConfig;

/// Builds the model prompt for one turn.
///
/// Optional inputs omit their section when absent; assembly itself
/// never fails.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    display_name: String,
    tone_directive: Option<String>,
    handoff_contact: Option<String>,
    history: Vec<HistoryTurn>,
    knowledge: Vec<String>,
    user_input: String,
}

impl PromptBuilder {
    pub fn new(config: &TenantConfig, user_input: impl Into<String>) -> Self {
        Self {
            display_name: config.display_name.clone(),
            tone_directive: config.tone_directive.clone(),
            handoff_contact: config.handoff_contact.clone(),
            history: Vec::new(),
            knowledge: Vec::new(),
            user_input: user_input.into(),
        }
    }

    /// Attach prior conversation turns
    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }

    /// Attach retrieved knowledge context chunks
    pub fn with_knowledge(mut self, knowledge: Vec<String>) -> Self {
        self.knowledge = knowledge;
        self
    }

    /// Render the prompt.
    pub fn build(self) -> String {
        let mut prompt = format!(
            "You are the support assistant for {}. Answer concisely and helpfully.",
            self.display_name
        );
        if let Some(tone) = &self.tone_directive {
            prompt.push_str(&format!(" Tone: {}.", tone));
        }

        if !self.history.is_empty() {
            prompt.push_str("\n\nRecent conversation:\n");
            for turn in &self.history {
                let label = match turn.role {
                    TurnRole::User => "Customer",
                    TurnRole::Assistant => "Assistant",
                };
                prompt.push_str(&format!("{}: {}\n", label, turn.content));
            }
            prompt.push_str("Continue this conversation naturally; keep continuity with what was already said.");
        }

        if self.knowledge.is_empty() {
            prompt.push_str("\n\nNo information is available for this question. ");
            match &self.handoff_contact {
                Some(contact) => prompt.push_str(&format!(
                    "Say so plainly and offer to hand the customer over to a human at {}.",
                    contact
                )),
                None => prompt
                    .push_str("Say so plainly and offer to hand the customer over to a human agent."),
            }
        } else {
            prompt.push_str("\n\nAnswer using only the following information:\n");
            for chunk in &self.knowledge {
                prompt.push_str(&format!("---\n{}\n", chunk));
            }
            prompt.push_str(
                "---\nPreserve formatting exactly: do not alter links, contact details, or markdown.",
            );
        }

        prompt.push_str(&format!("\n\nCustomer message: {}", self.user_input));
        prompt
    }
}
