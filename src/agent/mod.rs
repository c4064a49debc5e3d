//! Agent module - the tool-calling state machine.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Seed the conversation with the system prompt and the user message
//! 2. Call the model with the declared tools
//! 3. If the model requests tool calls, execute them and feed results back
//! 4. Repeat until the model answers without tool calls or max iterations is reached

mod agent_loop;
mod dispatcher;
mod invoker;
mod prompt;
mod state;

pub use agent_loop::{Agent, AgentError};
pub use dispatcher::ToolDispatcher;
pub use invoker::ModelInvoker;
pub use prompt::{DEFAULT_USER_PROMPT, SYSTEM_PROMPT};
pub use state::ConversationState;
