//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::DEFAULT_USER_PROMPT;

/// Prefix of every failure result.
pub const ERROR_RESULT_PREFIX: &str = "Error while processing request: ";

/// Invocation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// The user's message; the default greeting when absent
    pub prompt: String,
}

fn default_prompt() -> String {
    DEFAULT_USER_PROMPT.to_string()
}

impl InvocationRequest {
    /// Read the payload leniently: a missing, null or non-string `prompt`
    /// falls back to the default greeting.
    pub fn from_payload(payload: &Value) -> Self {
        let prompt = payload
            .get("prompt")
            .and_then(|p| p.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(default_prompt);
        Self { prompt }
    }
}

/// Invocation result. Always produced, even on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// Final assistant text, or an error description
    pub result: String,
}

impl InvocationResponse {
    pub fn error(cause: impl std::fmt::Display) -> Self {
        Self {
            result: format!("{}{}", ERROR_RESULT_PREFIX, cause),
        }
    }

    pub fn is_error(&self) -> bool {
        self.result.starts_with(ERROR_RESULT_PREFIX)
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    /// Service status
    pub status: String,

    /// Unix timestamp of the last status change
    pub time_of_last_update: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_prompt_uses_default_greeting() {
        for payload in [json!({}), json!({"prompt": null}), json!({"prompt": 42}), json!("x")] {
            assert_eq!(
                InvocationRequest::from_payload(&payload).prompt,
                DEFAULT_USER_PROMPT
            );
        }
    }

    #[test]
    fn prompt_is_taken_verbatim() {
        let req = InvocationRequest::from_payload(&json!({"prompt": "What is USD to EUR?"}));
        assert_eq!(req.prompt, "What is USD to EUR?");
    }

    #[test]
    fn error_result_is_prefixed() {
        let resp = InvocationResponse::error("model endpoint returned 500: boom");
        assert_eq!(
            resp.result,
            "Error while processing request: model endpoint returned 500: boom"
        );
        assert!(resp.is_error());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"result": resp.result})
        );
    }
}
