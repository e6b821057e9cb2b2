//! # courier-tools
//!
//! The agent-facing tool surface: the [`CourierTool`] trait, tool schema
//! and result types, and the built-in tool that stops a delegated
//! subagent run from inside an agent turn.

#![deny(unsafe_code)]

pub mod errors;
pub mod stop;
pub mod traits;

pub use errors::ToolError;
pub use stop::StopSubagentTool;
pub use traits::{
    CourierTool, Tool, ToolContext, ToolOutput, ToolParameterSchema, error_output, text_output,
};
