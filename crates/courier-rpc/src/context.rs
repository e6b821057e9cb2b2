//! Shared dependencies for RPC handlers.

use std::sync::Arc;

use courier_runs::{RunRegistry, StopCoordinator};

/// Shared state passed to every RPC handler.
#[derive(Clone)]
pub struct RpcContext {
    /// Run cancellation coordinator.
    pub coordinator: Arc<StopCoordinator>,
    /// Run registry, for read-only queries.
    pub runs: Arc<RunRegistry>,
}
