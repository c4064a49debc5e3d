//! Prompt constants for the agent.

/// Persona given to the model on every invocation.
pub const SYSTEM_PROMPT: &str =
    "You help users understand currency exchange rates and related context.";

/// User message used when the payload carries no prompt.
pub const DEFAULT_USER_PROMPT: &str = "Hello! How can I help you today?";
