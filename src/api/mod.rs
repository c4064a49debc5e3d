//! HTTP API for agent invocations.
//!
//! - `POST /invocations` runs the agent on a payload and always answers
//!   `200 {"result": "..."}`, with failures rendered as error text.
//! - `GET /ping` reports health.

pub mod types;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::Agent;
use crate::config::Config;

use types::{InvocationResponse, PingResponse};

/// Shared state for all handlers. Immutable after startup.
pub struct AppState {
    pub agent: Agent,
    pub started_at: i64,
}

/// Build the agent from `config` and serve until the process exits.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("currency-agent/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let state = Arc::new(AppState {
        agent: Agent::from_config(&config, http),
        started_at: chrono::Utc::now().timestamp(),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, routes(state)).await?;
    Ok(())
}

/// The API router.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/invocations", post(invocations))
        .route("/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn invocations(State(state): State<Arc<AppState>>, body: Bytes) -> Json<InvocationResponse> {
    let invocation_id = Uuid::new_v4();
    let span = tracing::info_span!("invocation", id = %invocation_id);

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            span.in_scope(|| tracing::warn!(error = %e, "Rejected unparseable payload"));
            return Json(InvocationResponse::error(format!("invalid payload: {}", e)));
        }
    };

    let response = state.agent.invoke(&payload).instrument(span).await;
    Json(response)
}

async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "Healthy".to_string(),
        time_of_last_update: state.started_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolSchema};
    use crate::telemetry::NoopSink;
    use async_trait::async_trait;

    struct Greeter;

    #[async_trait]
    impl LlmClient for Greeter {
        async fn chat_completion(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ChatResponse, LlmError> {
            let user = messages.last().map(|m| m.text().to_string()).unwrap_or_default();
            Ok(ChatResponse {
                content: Some(format!("you said: {}", user)),
                tool_calls: None,
                finish_reason: Some("stop".to_string()),
                usage: None,
            })
        }
    }

    async fn spawn_app() -> String {
        let config = Config::new(
            "test-model".to_string(),
            "http://127.0.0.1:9/v1".to_string(),
            "http://127.0.0.1:9".to_string(),
        );
        let agent = Agent::with_llm(
            &config,
            Arc::new(Greeter),
            reqwest::Client::new(),
            Arc::new(NoopSink),
        );
        let state = Arc::new(AppState {
            agent,
            started_at: 0,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn invocation_returns_result() {
        let base = spawn_app().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/invocations", base))
            .json(&serde_json::json!({"prompt": "Hello"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: InvocationResponse = resp.json().await.unwrap();
        assert_eq!(body.result, "you said: Hello");
    }

    #[tokio::test]
    async fn unparseable_payload_still_returns_result() {
        let base = spawn_app().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/invocations", base))
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: InvocationResponse = resp.json().await.unwrap();
        assert!(body.is_error());
        assert!(body.result.contains("invalid payload"));
    }

    #[tokio::test]
    async fn ping_reports_healthy() {
        let base = spawn_app().await;
        let body: Value = reqwest::get(format!("{}/ping", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "Healthy");
    }
}
