//! Model turn: send the history, append the assistant's reply.

use std::sync::Arc;

use crate::llm::{ChatMessage, LlmClient, LlmError, ToolSchema};
use crate::telemetry::TracingSink;

use super::state::ConversationState;

/// Chat model bound to a fixed model id and tool set.
pub struct ModelInvoker {
    llm: Arc<dyn LlmClient>,
    model: String,
    tool_schemas: Vec<ToolSchema>,
    sink: Arc<dyn TracingSink>,
}

impl ModelInvoker {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        tool_schemas: Vec<ToolSchema>,
        sink: Arc<dyn TracingSink>,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            tool_schemas,
            sink,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one model turn over the full history.
    ///
    /// The returned assistant message has already been appended to `state`.
    /// Model failures are returned unchanged and leave `state` untouched.
    pub async fn invoke(&self, state: &mut ConversationState) -> Result<ChatMessage, LlmError> {
        let response = match self
            .llm
            .chat_completion(&self.model, state.messages(), Some(&self.tool_schemas))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.sink
                    .on_model_error(&self.model, state.messages(), &e.to_string());
                return Err(e);
            }
        };

        let message = ChatMessage::assistant(response.content, response.tool_calls);
        tracing::debug!(
            tool_calls = message.pending_tool_calls().len(),
            finish_reason = ?response.finish_reason,
            "Model turn complete"
        );

        self.sink.on_model_turn(&self.model, state.messages(), &message);
        state.push(message.clone());
        Ok(message)
    }
}
