//! Tool turn: execute requested tool calls and append their results.

use std::sync::Arc;

use crate::llm::{ChatMessage, ToolCall};
use crate::telemetry::TracingSink;
use crate::tools::{render_tool_result, ToolRegistry};

use super::state::ConversationState;

/// Executes tool calls against the registry, one at a time.
pub struct ToolDispatcher {
    tools: ToolRegistry,
    sink: Arc<dyn TracingSink>,
}

impl ToolDispatcher {
    pub fn new(tools: ToolRegistry, sink: Arc<dyn TracingSink>) -> Self {
        Self { tools, sink }
    }

    /// Execute each call in order and append exactly one tool-result message
    /// per call. Tool failures become result content; this never fails.
    pub async fn dispatch(&self, state: &mut ConversationState, tool_calls: &[ToolCall]) {
        for tool_call in tool_calls {
            tracing::debug!(
                tool = %tool_call.function.name,
                args = %tool_call.function.arguments,
                "Calling tool"
            );

            let result = self
                .tools
                .execute(&tool_call.function.name, &tool_call.function.arguments)
                .await;

            if let Err(e) = &result {
                tracing::warn!(tool = %tool_call.function.name, error = %e, "Tool call failed");
            }

            let content = render_tool_result(&result);
            self.sink.on_tool_result(tool_call, &content);
            state.push(ChatMessage::tool_result(tool_call.id.clone(), content));
        }
    }
}
