//! Conversation history for a single invocation.

use crate::llm::{ChatMessage, Role, ToolCall};

/// Ordered, append-only message history owned by one agent run.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    /// Fresh state seeded with the system prompt and the user's message.
    pub fn seeded(system_prompt: &str, user_message: &str) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_message),
            ],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Content of the last message, empty if there is none.
    pub fn last_content(&self) -> String {
        self.last().map(|m| m.text().to_string()).unwrap_or_default()
    }

    /// Tool calls of the latest assistant message that have no tool result yet.
    pub fn unresolved_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(idx) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[idx + 1..]
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages[idx]
            .pending_tool_calls()
            .iter()
            .filter(|call| !answered.contains(&call.id.as_str()))
            .collect()
    }
}
