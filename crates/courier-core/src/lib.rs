//! # courier-core
//!
//! Foundation types for the Courier subagent control plane.
//!
//! This crate provides the shared vocabulary the other Courier crates
//! depend on:
//!
//! - **Branded IDs**: `RunId`, `SessionKey`, `EngineSessionId`, `ToolCallId`
//!   as newtypes for type safety
//! - **Events**: `ChatEvent` and `ActivityEvent` — the two event families
//!   the client-side reconciler consumes, in their camelCase wire format
//! - **Logging**: the `tracing` subscriber bootstrap

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod logging;

pub use events::{ActivityEvent, ActivityPhase, ActivityStream, ChatEvent, ChatState};
pub use ids::{EngineSessionId, RunId, SessionKey, ToolCallId};
