//! Tool system: the capabilities the model may call by name.
//!
//! Every tool declares a JSON schema for its arguments. The registry validates
//! arguments against that schema before handing them to the tool, so tools can
//! assume well-typed input.

mod exchange_rate;

pub use exchange_rate::{ExchangeRateTool, RateLookupError, RateQuery};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::{FunctionSchema, ToolSchema};

/// Failure of a single tool call. Always reported back to the model as data.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    RateLookup(#[from] RateLookupError),
}

/// Outcome of a tool call: a JSON payload or a typed failure.
pub type ToolResult = Result<Value, ToolError>;

/// Serialize a tool outcome into tool-result message content.
pub fn render_tool_result(result: &ToolResult) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(e) => json!({ "error": e.to_string() }).to_string(),
    }
}

/// A capability exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool with schema-validated arguments.
    async fn execute(&self, args: Value) -> ToolResult;
}

/// Registry mapping tool names to handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the exchange rate tool, the only tool the agent exposes.
    pub fn with_exchange_rate(tool: ExchangeRateTool) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(tool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Tool declarations in the shape the model expects.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| ToolSchema {
                schema_type: "function".to_string(),
                function: FunctionSchema {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    /// Execute a tool by name with raw JSON-encoded arguments.
    pub async fn execute(&self, name: &str, raw_args: &str) -> ToolResult {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = parse_arguments(name, raw_args)?;
        validate_arguments(name, &tool.parameters_schema(), &args)?;

        tool.execute(args).await
    }
}

/// Parse model-emitted arguments. An empty string means "no arguments".
fn parse_arguments(tool: &str, raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("arguments are not valid JSON: {}", e),
    })
}

/// Check an arguments object against the subset of JSON schema tools declare:
/// object type, `required` keys, and primitive `type` of each known property.
fn validate_arguments(tool: &str, schema: &Value, args: &Value) -> Result<(), ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };

    let obj = args
        .as_object()
        .ok_or_else(|| invalid("arguments must be a JSON object".to_string()))?;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !obj.contains_key(key) {
                return Err(invalid(format!("missing required argument '{}'", key)));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (key, value) in obj {
        let Some(expected) = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
        else {
            continue;
        };
        if !matches_type(expected, value) {
            return Err(invalid(format!("argument '{}' must be of type {}", key, expected)));
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes its arguments back.
    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                    "times": {"type": "integer"}
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value) -> ToolResult {
            Ok(args)
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        registry
    }

    #[tokio::test]
    async fn executes_registered_tool() {
        let result = registry().execute("echo", r#"{"text":"hi"}"#).await.unwrap();
        assert_eq!(result, json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_value() {
        let err = registry().execute("nope", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "nope"));
        assert_eq!(
            render_tool_result(&Err(err)),
            r#"{"error":"unknown tool 'nope'"}"#
        );
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let err = registry().execute("echo", "{not json").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn rejects_missing_required_and_wrong_types() {
        let err = registry().execute("echo", r#"{"times":2}"#).await.unwrap_err();
        assert!(err.to_string().contains("missing required argument 'text'"));

        let err = registry()
            .execute("echo", r#"{"text":"a","times":"two"}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'times' must be of type integer"));

        let err = registry().execute("echo", "[1,2]").await.unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
    }

    #[test]
    fn schemas_follow_registration_order() {
        let schemas = registry().get_tool_schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].schema_type, "function");
        assert_eq!(schemas[0].function.name, "echo");
        assert_eq!(schemas[0].function.description, "Echo the input");
    }

    #[test]
    fn renders_success_payload() {
        let rendered = render_tool_result(&Ok(json!({"rates": {"EUR": 0.92}})));
        assert_eq!(rendered, r#"{"rates":{"EUR":0.92}}"#);
    }
}
