//! Tool error types.

use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// Validation failures are usually reported as app-level error outputs
/// rather than raised; these variants cover failures the agent loop has
/// to handle itself.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Parameter validation failed.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (catch-all).
    #[error("{message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}
