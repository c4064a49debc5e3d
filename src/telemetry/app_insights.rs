//! Azure Application Insights exporter.
//!
//! Each turn becomes one custom event envelope posted to the ingestion
//! endpoint's `/v2/track` route from a detached task. Delivery is best-effort.

use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use super::{TelemetryError, TracingSink};
use crate::config::AgentIdentity;
use crate::llm::{ChatMessage, ToolCall};

const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com";

/// Upper bound on a single ingestion request.
pub const INGESTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Parsed `Key=Value;Key=Value` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub instrumentation_key: String,
    pub ingestion_endpoint: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, TelemetryError> {
        let mut instrumentation_key = None;
        let mut ingestion_endpoint = None;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| TelemetryError::MalformedSegment(segment.to_string()))?;
            match key.trim().to_ascii_lowercase().as_str() {
                "instrumentationkey" => instrumentation_key = Some(value.trim().to_string()),
                "ingestionendpoint" => ingestion_endpoint = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let instrumentation_key = instrumentation_key
            .filter(|k| !k.is_empty())
            .ok_or(TelemetryError::MissingField("InstrumentationKey"))?;
        let ingestion_endpoint = ingestion_endpoint
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_INGESTION_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            instrumentation_key,
            ingestion_endpoint,
        })
    }

    fn track_url(&self) -> String {
        format!("{}/v2/track", self.ingestion_endpoint)
    }
}

/// Sink that records turns as Application Insights custom events.
pub struct AppInsightsSink {
    http: reqwest::Client,
    connection: ConnectionString,
    identity: AgentIdentity,
    timeout: Duration,
}

impl AppInsightsSink {
    pub fn new(http: reqwest::Client, connection: ConnectionString, identity: AgentIdentity) -> Self {
        Self {
            http,
            connection,
            identity,
            timeout: INGESTION_TIMEOUT,
        }
    }

    /// Override the ingestion request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn envelope(&self, event_name: &str, mut properties: serde_json::Map<String, Value>) -> Value {
        properties.insert("gen_ai.agent.name".into(), json!(self.identity.name));
        properties.insert("gen_ai.agent.id".into(), json!(self.identity.id));
        properties.insert(
            "gen_ai.provider.name".into(),
            json!(self.identity.provider_name),
        );

        json!({
            "name": "Microsoft.ApplicationInsights.Event",
            "time": Utc::now().to_rfc3339(),
            "iKey": self.connection.instrumentation_key,
            "tags": {
                "ai.cloud.role": self.identity.name,
                "ai.cloud.roleInstance": self.identity.id,
            },
            "data": {
                "baseType": "EventData",
                "baseData": {
                    "ver": 2,
                    "name": event_name,
                    "properties": properties,
                }
            }
        })
    }

    /// Post one envelope in the background. Requires a Tokio runtime; without
    /// one the event is dropped and `None` is returned.
    fn send(&self, envelope: Value) -> Option<JoinHandle<()>> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available; dropping telemetry event");
            return None;
        };

        let request = self
            .http
            .post(self.connection.track_url())
            .timeout(self.timeout)
            .json(&[envelope]);
        Some(handle.spawn(async move {
            if let Err(e) = deliver(request).await {
                tracing::warn!(error = %e, "Failed to send telemetry event");
            }
        }))
    }
}

async fn deliver(request: reqwest::RequestBuilder) -> Result<(), TelemetryError> {
    let resp = request.send().await?;
    if !resp.status().is_success() {
        return Err(TelemetryError::Rejected(resp.status().as_u16()));
    }
    Ok(())
}

fn to_json_string<T: serde::Serialize + ?Sized>(value: &T) -> Value {
    Value::String(serde_json::to_string(value).unwrap_or_default())
}

impl TracingSink for AppInsightsSink {
    fn on_model_turn(&self, model: &str, input: &[ChatMessage], output: &ChatMessage) {
        let tool_names = output
            .pending_tool_calls()
            .iter()
            .map(|c| c.function.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut properties = serde_json::Map::new();
        properties.insert("gen_ai.operation.name".into(), json!("chat"));
        properties.insert("gen_ai.request.model".into(), json!(model));
        properties.insert("gen_ai.input.message_count".into(), json!(input.len().to_string()));
        properties.insert("gen_ai.input.messages".into(), to_json_string(input));
        properties.insert("gen_ai.output.messages".into(), to_json_string(output));
        properties.insert("gen_ai.response.tool_calls".into(), json!(tool_names));

        self.send(self.envelope("gen_ai.chat", properties));
    }

    fn on_model_error(&self, model: &str, input: &[ChatMessage], error: &str) {
        let mut properties = serde_json::Map::new();
        properties.insert("gen_ai.operation.name".into(), json!("chat"));
        properties.insert("gen_ai.request.model".into(), json!(model));
        properties.insert("gen_ai.input.message_count".into(), json!(input.len().to_string()));
        properties.insert("error.message".into(), json!(error));

        self.send(self.envelope("gen_ai.chat.error", properties));
    }

    fn on_tool_result(&self, call: &ToolCall, content: &str) {
        let mut properties = serde_json::Map::new();
        properties.insert("gen_ai.operation.name".into(), json!("execute_tool"));
        properties.insert("gen_ai.tool.name".into(), json!(call.function.name));
        properties.insert("gen_ai.tool.call.id".into(), json!(call.id));
        properties.insert("gen_ai.tool.call.arguments".into(), json!(call.function.arguments));
        properties.insert("gen_ai.tool.call.result".into(), json!(content));

        self.send(self.envelope("gen_ai.execute_tool", properties));
    }
}
