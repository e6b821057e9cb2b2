//! Core tool trait and schema types.
//!
//! Defines [`CourierTool`], the trait every agent-invocable tool
//! implements, plus the JSON Schema definition sent to the model and the
//! structured result returned from execution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use courier_core::{SessionKey, ToolCallId};

use crate::errors::ToolError;

// ─────────────────────────────────────────────────────────────────────────────
// Tool context
// ─────────────────────────────────────────────────────────────────────────────

/// Execution context passed to every tool invocation.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Unique ID of this tool call.
    pub tool_call_id: ToolCallId,
    /// Session key of the agent invoking this tool. Always set by the
    /// agent loop, never by the model.
    pub session_key: SessionKey,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool schema
// ─────────────────────────────────────────────────────────────────────────────

/// JSON Schema-compatible parameter definition for a tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolParameterSchema {
    /// Top-level JSON Schema type.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property definitions (when type is `object`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Map<String, Value>>,
    /// Required property names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// A tool definition that can be sent to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: ToolParameterSchema,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool result
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a tool execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    /// Text output shown to the model.
    pub content: String,
    /// Optional structured details (tool-specific metadata).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Whether the execution resulted in an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Create a simple text result.
#[must_use]
pub fn text_output(text: impl Into<String>, details: Option<Value>) -> ToolOutput {
    ToolOutput {
        content: text.into(),
        details,
        is_error: None,
    }
}

/// Create an app-level error result with a stable status payload.
#[must_use]
pub fn error_output(message: impl Into<String>) -> ToolOutput {
    let message = message.into();
    ToolOutput {
        details: Some(json!({"status": "error", "message": message})),
        content: message,
        is_error: Some(true),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CourierTool trait
// ─────────────────────────────────────────────────────────────────────────────

/// The core trait that every tool must implement.
#[async_trait]
pub trait CourierTool: Send + Sync {
    /// Tool name, the exact string sent to/from the model.
    fn name(&self) -> &str;

    /// Generate the [`Tool`] schema for the model.
    fn definition(&self) -> Tool;

    /// Execute the tool with JSON arguments.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

/// Pull a required string parameter, reporting a missing or blank value
/// as an app-level error output instead of a raised error.
pub(crate) fn require_string(params: &Value, key: &str) -> Result<String, ToolOutput> {
    match params.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_owned()),
        _ => Err(error_output(format!("Missing required parameter: {key}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_output_has_stable_payload() {
        let out = error_output("Missing required parameter: runId");
        assert_eq!(out.is_error, Some(true));
        let details = out.details.unwrap();
        assert_eq!(details["status"], "error");
        assert_eq!(details["message"], "Missing required parameter: runId");
    }

    #[test]
    fn require_string_rejects_blank() {
        let params = json!({"runId": "   "});
        assert!(require_string(&params, "runId").is_err());
    }

    #[test]
    fn require_string_rejects_non_string() {
        let params = json!({"runId": 42});
        assert!(require_string(&params, "runId").is_err());
    }

    #[test]
    fn require_string_accepts_value() {
        let params = json!({"runId": "run-1"});
        assert_eq!(require_string(&params, "runId").unwrap(), "run-1");
    }

    #[test]
    fn tool_output_wire_format() {
        let out = text_output("done", Some(json!({"status": "stopped"})));
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["content"], "done");
        assert_eq!(v["details"]["status"], "stopped");
        assert!(v.get("isError").is_none());
    }
}
