//! Turn-level telemetry.
//!
//! The agent reports every model turn and every tool result to a
//! [`TracingSink`]. When no telemetry backend is configured the [`NoopSink`]
//! is used, so the loop never checks whether tracing is enabled.

mod app_insights;

pub use app_insights::{AppInsightsSink, ConnectionString};

use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::llm::{ChatMessage, ToolCall};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("connection string is missing {0}")]
    MissingField(&'static str),

    #[error("malformed connection string segment: {0}")]
    MalformedSegment(String),

    #[error("telemetry request failed: {0}")]
    Send(#[from] reqwest::Error),

    #[error("ingestion endpoint returned {0}")]
    Rejected(u16),
}

/// Observer of agent turns. Implementations must not block and must not fail.
pub trait TracingSink: Send + Sync {
    /// Called once per successful model call.
    fn on_model_turn(&self, model: &str, input: &[ChatMessage], output: &ChatMessage);

    /// Called when a model call fails.
    fn on_model_error(&self, _model: &str, _input: &[ChatMessage], _error: &str) {}

    /// Called once per executed tool call with the rendered result.
    fn on_tool_result(&self, _call: &ToolCall, _content: &str) {}
}

/// Sink used when telemetry is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TracingSink for NoopSink {
    fn on_model_turn(&self, _model: &str, _input: &[ChatMessage], _output: &ChatMessage) {}
}

/// Build the process-wide sink from configuration.
///
/// Never fails: a missing connection string disables telemetry, and a
/// connection string that cannot be used is logged and also disables it.
pub fn sink_from_config(config: &Config, http: reqwest::Client) -> Arc<dyn TracingSink> {
    let Some(raw) = config.tracing_connection_string.as_deref() else {
        tracing::info!(
            "APPLICATION_INSIGHTS_CONNECTION_STRING not provided; telemetry disabled"
        );
        return Arc::new(NoopSink);
    };

    match ConnectionString::parse(raw) {
        Ok(connection) => {
            tracing::info!(
                endpoint = %connection.ingestion_endpoint,
                "Application Insights telemetry enabled"
            );
            Arc::new(AppInsightsSink::new(
                http,
                connection,
                config.identity.clone(),
            ))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not initialize Application Insights telemetry; continuing without it"
            );
            Arc::new(NoopSink)
        }
    }
}
