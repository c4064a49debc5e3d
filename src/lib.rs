//! # Currency Agent
//!
//! A single-turn agent that answers currency exchange questions.
//!
//! This library provides:
//! - A tool-calling agent loop over an OpenAI-compatible chat model
//! - An exchange rate lookup tool backed by a Frankfurter-style rate service
//! - Optional turn telemetry exported to Application Insights
//! - An HTTP API (`POST /invocations`, `GET /ping`)
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a payload with an optional `prompt`
//! 2. Seed the conversation with the system prompt and the user message
//! 3. Call the model; if it requests tool calls, execute them and append results
//! 4. Repeat until the model answers without tool calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use currency_agent::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config, reqwest::Client::new());
//! let response = agent.invoke(&serde_json::json!({"prompt": "USD to EUR?"})).await;
//! println!("{}", response.result);
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod telemetry;
pub mod tools;

pub use config::Config;
