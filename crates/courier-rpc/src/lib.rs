//! # courier-rpc
//!
//! The trusted control-plane surface: JSON request/response wire types,
//! an async method registry with per-handler timeouts, and the subagent
//! run-management handlers.
//!
//! Requests on this surface come from operators and first-party clients,
//! not from models, so handlers skip the ownership check the agent tool
//! path enforces.

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod types;

pub use context::RpcContext;
pub use errors::RpcError;
pub use registry::{MethodHandler, MethodRegistry};
pub use types::{RpcErrorBody, RpcEvent, RpcRequest, RpcResponse};
