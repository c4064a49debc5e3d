//! Configuration management for the currency agent.
//!
//! Configuration is read from environment variables (a `.env` file in the
//! working directory is loaded first by the binary, if present):
//! - `AWS_REGION` - Required. Region hosting the model endpoint.
//! - `BEDROCK_MODEL_ID` - Required. Model identifier sent with every chat request.
//! - `AGENT_NAME` - Required. Agent name reported to telemetry.
//! - `AGENT_ID` - Required. Agent identifier reported to telemetry.
//! - `PROVIDER_NAME` - Required. Model provider name reported to telemetry.
//! - `APPLICATION_INSIGHTS_CONNECTION_STRING` - Optional. Enables turn telemetry.
//! - `AWS_BEARER_TOKEN_BEDROCK` - Optional. Bearer token for the model endpoint.
//! - `BEDROCK_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to the
//!   regional `bedrock-runtime` endpoint.
//! - `RATE_SERVICE_URL` - Optional. Exchange rate service. Defaults to `https://api.frankfurter.app`.
//! - `LLM_TIMEOUT_SECS` - Optional. Model call timeout. Defaults to `120`.
//! - `MAX_ITERATIONS` - Optional. Maximum model turns per invocation. Defaults to `10`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8080`.

use std::time::Duration;
use thiserror::Error;

/// Default exchange rate service.
pub const DEFAULT_RATE_SERVICE_URL: &str = "https://api.frankfurter.app";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Identity of the agent as reported to telemetry.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub name: String,
    pub id: String,
    pub provider_name: String,
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Region of the model endpoint
    pub region: String,

    /// Model identifier
    pub model_id: String,

    /// Agent identity (name, id, provider)
    pub identity: AgentIdentity,

    /// Telemetry connection string; tracing is disabled when absent
    pub tracing_connection_string: Option<String>,

    /// Bearer token for the model endpoint
    pub llm_api_key: Option<String>,

    /// OpenAI-compatible base URL for chat completions
    pub llm_base_url: String,

    /// Timeout applied to each model call
    pub llm_timeout: Duration,

    /// Exchange rate service base URL
    pub rate_service_url: String,

    /// Maximum model turns per invocation
    pub max_iterations: usize,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` naming the first required variable
    /// that is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Set-but-empty counts as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let region = require("AWS_REGION")?;
        let model_id = require("BEDROCK_MODEL_ID")?;
        let identity = AgentIdentity {
            name: require("AGENT_NAME")?,
            id: require("AGENT_ID")?,
            provider_name: require("PROVIDER_NAME")?,
        };

        let llm_base_url = get("BEDROCK_BASE_URL")
            .unwrap_or_else(|| default_llm_base_url(&region))
            .trim_end_matches('/')
            .to_string();

        let rate_service_url = get("RATE_SERVICE_URL")
            .unwrap_or_else(|| DEFAULT_RATE_SERVICE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let llm_timeout = Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 120)?);

        let max_iterations: usize = parse_or("MAX_ITERATIONS", get("MAX_ITERATIONS"), 10)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", get("PORT"), 8080)?;

        Ok(Self {
            region,
            model_id,
            identity,
            tracing_connection_string: get("APPLICATION_INSIGHTS_CONNECTION_STRING"),
            llm_api_key: get("AWS_BEARER_TOKEN_BEDROCK"),
            llm_base_url,
            llm_timeout,
            rate_service_url,
            max_iterations,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(model_id: String, llm_base_url: String, rate_service_url: String) -> Self {
        Self {
            region: "us-east-1".to_string(),
            model_id,
            identity: AgentIdentity {
                name: "currency-agent".to_string(),
                id: "currency-agent-local".to_string(),
                provider_name: "aws.bedrock".to_string(),
            },
            tracing_connection_string: None,
            llm_api_key: None,
            llm_base_url,
            llm_timeout: Duration::from_secs(120),
            rate_service_url,
            max_iterations: 10,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

fn default_llm_base_url(region: &str) -> String {
    format!("https://bedrock-runtime.{}.amazonaws.com/openai/v1", region)
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}
