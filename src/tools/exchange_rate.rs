//! Exchange rate lookup against a Frankfurter-style rate service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::{Tool, ToolError, ToolResult};

/// Upstream request timeout.
pub const RATE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Any failure talking to the rate service: network, status or body.
#[derive(Debug, Error)]
#[error("rate lookup failed: {0}")]
pub struct RateLookupError(#[from] reqwest::Error);

/// Arguments of `get_exchange_rate`, with the defaults the model sees.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateQuery {
    pub currency_from: String,
    pub currency_to: String,
    pub currency_date: String,
}

impl Default for RateQuery {
    fn default() -> Self {
        Self {
            currency_from: "USD".to_string(),
            currency_to: "EUR".to_string(),
            currency_date: "latest".to_string(),
        }
    }
}

/// Retrieve the exchange rate between two currencies on a date.
pub struct ExchangeRateTool {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ExchangeRateTool {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: RATE_LOOKUP_TIMEOUT,
        }
    }

    /// Override the upstream timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Single GET `{base_url}/{date}?base=..&symbols=..`, no retries.
    ///
    /// Returns the service's JSON object as-is.
    pub async fn lookup(&self, query: &RateQuery) -> Result<Map<String, Value>, RateLookupError> {
        let url = format!(
            "{}/{}",
            self.base_url,
            urlencoding::encode(query.currency_date.trim())
        );

        tracing::info!(
            base = %query.currency_from,
            target = %query.currency_to,
            date = %query.currency_date,
            "Looking up exchange rate"
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("base", query.currency_from.as_str()),
                ("symbols", query.currency_to.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Map<String, Value>>().await?)
    }
}

#[async_trait]
impl Tool for ExchangeRateTool {
    fn name(&self) -> &str {
        "get_exchange_rate"
    }

    fn description(&self) -> &str {
        "Retrieve the exchange rate between two currencies on a specific date."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "currency_from": {
                    "type": "string",
                    "description": "Currency code to convert from (default: USD)"
                },
                "currency_to": {
                    "type": "string",
                    "description": "Currency code to convert to (default: EUR)"
                },
                "currency_date": {
                    "type": "string",
                    "description": "Date in YYYY-MM-DD format, or 'latest' (default: latest)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let query: RateQuery =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                reason: e.to_string(),
            })?;

        for (field, value) in [
            ("currency_from", &query.currency_from),
            ("currency_to", &query.currency_to),
            ("currency_date", &query.currency_date),
        ] {
            if value.trim().is_empty() {
                return Err(ToolError::InvalidArguments {
                    tool: self.name().to_string(),
                    reason: format!("'{}' must not be empty", field),
                });
            }
        }

        let payload = self.lookup(&query).await?;
        Ok(Value::Object(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(server: &MockServer) -> ExchangeRateTool {
        ExchangeRateTool::new(reqwest::Client::new(), server.uri())
    }

    fn frankfurter_body() -> Value {
        json!({
            "amount": 1.0,
            "base": "USD",
            "date": "2024-05-02",
            "rates": {"EUR": 0.92}
        })
    }

    #[tokio::test]
    async fn defaults_query_latest_usd_to_eur() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "USD"))
            .and(query_param("symbols", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(frankfurter_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = tool(&mock_server).execute(json!({})).await.unwrap();
        assert_eq!(result["rates"]["EUR"], json!(0.92));
    }

    #[tokio::test]
    async fn passes_explicit_date_and_currencies() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2024-01-15"))
            .and(query_param("base", "GBP"))
            .and(query_param("symbols", "JPY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "base": "GBP",
                "date": "2024-01-15",
                "rates": {"JPY": 186.5}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let query = RateQuery {
            currency_from: "GBP".to_string(),
            currency_to: "JPY".to_string(),
            currency_date: "2024-01-15".to_string(),
        };
        let payload = tool(&mock_server).lookup(&query).await.unwrap();
        assert_eq!(payload["rates"]["JPY"], json!(186.5));
    }

    #[tokio::test]
    async fn repeated_lookups_have_the_same_shape() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(frankfurter_body()))
            .mount(&mock_server)
            .await;

        let tool = tool(&mock_server);
        let first = tool.lookup(&RateQuery::default()).await.unwrap();
        let second = tool.lookup(&RateQuery::default()).await.unwrap();
        let keys = |m: &Map<String, Value>| m.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
    }

    #[tokio::test]
    async fn http_error_status_is_a_lookup_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
            .mount(&mock_server)
            .await;

        let err = tool(&mock_server).execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::RateLookup(_)));
        assert!(err.to_string().starts_with("rate lookup failed"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_lookup_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let err = tool(&mock_server)
            .lookup(&RateQuery::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("rate lookup failed"));
    }

    #[tokio::test]
    async fn timeout_is_a_lookup_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(frankfurter_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let err = tool(&mock_server)
            .with_timeout(Duration::from_millis(50))
            .execute(json!({}))
            .await
            .unwrap_err();
        match err {
            ToolError::RateLookup(RateLookupError(source)) => assert!(source.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_currency_is_rejected_without_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(frankfurter_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = tool(&mock_server)
            .execute(json!({"currency_from": " "}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'currency_from' must not be empty"));
    }
}
