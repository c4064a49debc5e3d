//! Core agent loop implementation.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::api::types::{InvocationRequest, InvocationResponse};
use crate::config::Config;
use crate::llm::{BedrockClient, LlmClient, LlmError, ToolCall};
use crate::telemetry::{self, TracingSink};
use crate::tools::{ExchangeRateTool, ToolRegistry};

use super::dispatcher::ToolDispatcher;
use super::invoker::ModelInvoker;
use super::prompt::SYSTEM_PROMPT;
use super::state::ConversationState;

/// Errors that end an invocation. Tool failures never show up here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("max turns ({0}) reached without a final answer")]
    MaxTurnsExceeded(usize),

    #[error("{0} tool call(s) left unanswered before the next model turn")]
    UnresolvedToolCalls(usize),
}

/// Position in the model/tool state machine.
#[derive(Debug)]
enum LoopState {
    AssistantTurn,
    ToolTurn(Vec<ToolCall>),
    Done,
}

/// The currency agent. Built once at startup and shared across invocations;
/// each invocation gets its own [`ConversationState`].
pub struct Agent {
    invoker: ModelInvoker,
    dispatcher: ToolDispatcher,
    max_iterations: usize,
}

impl Agent {
    /// Assemble an agent from its parts.
    pub fn new(invoker: ModelInvoker, dispatcher: ToolDispatcher, max_iterations: usize) -> Self {
        Self {
            invoker,
            dispatcher,
            max_iterations,
        }
    }

    /// Create the agent described by `config`, sharing one HTTP client
    /// between the model, the rate tool and telemetry.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let sink = telemetry::sink_from_config(config, http.clone());
        let llm: Arc<dyn LlmClient> = Arc::new(BedrockClient::new(
            http.clone(),
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_timeout,
        ));
        Self::with_llm(config, llm, http, sink)
    }

    /// Like [`Agent::from_config`] with an explicit model client and sink.
    pub fn with_llm(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        http: reqwest::Client,
        sink: Arc<dyn TracingSink>,
    ) -> Self {
        let tools = ToolRegistry::with_exchange_rate(ExchangeRateTool::new(
            http,
            config.rate_service_url.clone(),
        ));
        let invoker = ModelInvoker::new(
            llm,
            config.model_id.clone(),
            tools.get_tool_schemas(),
            sink.clone(),
        );
        let dispatcher = ToolDispatcher::new(tools, sink);
        Self::new(invoker, dispatcher, config.max_iterations)
    }

    /// Entry point: never fails, every error becomes an error-text result.
    pub async fn invoke(&self, payload: &Value) -> InvocationResponse {
        let request = InvocationRequest::from_payload(payload);
        match self.run(&request.prompt).await {
            Ok(state) => InvocationResponse {
                result: state.last_content(),
            },
            Err(e) => {
                tracing::error!(error = %e, "Invocation failed");
                InvocationResponse::error(e)
            }
        }
    }

    /// Run the loop for one user message and return the full conversation.
    pub async fn run(&self, user_message: &str) -> Result<ConversationState, AgentError> {
        self.drive(ConversationState::seeded(SYSTEM_PROMPT, user_message))
            .await
    }

    /// Step the state machine from an assistant turn until it finishes.
    ///
    /// Every tool call of the latest assistant message must already be
    /// answered before the model is called again.
    async fn drive(&self, mut state: ConversationState) -> Result<ConversationState, AgentError> {
        let mut next = LoopState::AssistantTurn;
        let mut iterations = 0;

        loop {
            next = match next {
                LoopState::AssistantTurn => {
                    let unresolved = state.unresolved_tool_calls().len();
                    if unresolved > 0 {
                        return Err(AgentError::UnresolvedToolCalls(unresolved));
                    }
                    if iterations >= self.max_iterations {
                        return Err(AgentError::MaxTurnsExceeded(self.max_iterations));
                    }
                    iterations += 1;
                    tracing::debug!("Agent iteration {}", iterations);

                    let message = self.invoker.invoke(&mut state).await?;
                    match message.tool_calls {
                        Some(calls) if !calls.is_empty() => LoopState::ToolTurn(calls),
                        _ => LoopState::Done,
                    }
                }
                LoopState::ToolTurn(calls) => {
                    self.dispatcher.dispatch(&mut state, &calls).await;
                    LoopState::AssistantTurn
                }
                LoopState::Done => {
                    if state.last_content().is_empty() {
                        tracing::warn!("Model finished with empty content");
                    }
                    tracing::info!(
                        iterations,
                        messages = state.messages().len(),
                        model = %self.invoker.model(),
                        "Agent finished"
                    );
                    return Ok(state);
                }
            };
        }
    }
}
