//! # courier-runs
//!
//! Process-wide registry of in-flight delegated subagent runs, and the
//! coordinator that terminates a specific run on request.
//!
//! - [`RunRegistry`]: in-memory table keyed by run ID. Records are created
//!   when a delegated run is accepted, mutated only to set `ended_at`, and
//!   removed only by a full reset — so "not found" and "existed but ended"
//!   stay distinguishable for a run's natural life.
//! - [`StopCoordinator`]: ownership-checked, idempotent, race-safe stop of
//!   one run, coordinating the inbound message queue and the embedded
//!   execution engine through injected collaborator traits.

#![deny(unsafe_code)]

pub mod coordinator;
pub mod registry;

pub use coordinator::{
    CoordinatorError, EngineAbort, InboundQueue, SessionStore, StopCoordinator, StopOutcome,
};
pub use registry::{CleanupMode, RegistryError, RunRegistry, SubagentRunRecord};
