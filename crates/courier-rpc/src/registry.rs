//! Method registry and async dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use tracing::warn;

use crate::context::RpcContext;
use crate::errors::{self, RpcError};
use crate::types::{RpcRequest, RpcResponse};

/// Trait implemented by every RPC method handler.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Execute the handler with the given params and context.
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError>;
}

/// Registry mapping method names to handlers.
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a method name.
    pub fn register(&mut self, method: &str, handler: impl MethodHandler + 'static) {
        let _ = self.handlers.insert(method.to_owned(), Arc::new(handler));
    }

    /// Maximum time a single method handler is allowed to run.
    const HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

    /// Dispatch a request to its handler.
    ///
    /// Unknown methods, handler errors, and timeouts all come back as
    /// error responses carrying the request ID; every dispatch lands in
    /// the `subagent_rpc_requests_total` counter under its outcome label.
    pub async fn dispatch(&self, request: RpcRequest, ctx: &RpcContext) -> RpcResponse {
        let RpcRequest { id, method, params } = request;
        let start = std::time::Instant::now();

        let (response, outcome) = if let Some(handler) = self.handlers.get(&method) {
            match tokio::time::timeout(Self::HANDLER_TIMEOUT, handler.handle(params, ctx)).await {
                Ok(Ok(result)) => (RpcResponse::success(&id, result), "ok"),
                Ok(Err(err)) => {
                    warn!(method, code = err.code(), %err, "method handler failed");
                    (
                        RpcResponse {
                            id,
                            success: false,
                            result: None,
                            error: Some(err.to_error_body()),
                        },
                        "handler_error",
                    )
                }
                Err(_elapsed) => {
                    warn!(method, timeout = ?Self::HANDLER_TIMEOUT, "method handler timed out");
                    (
                        RpcResponse::error(
                            &id,
                            errors::INTERNAL_ERROR,
                            format!("Handler for '{method}' timed out"),
                        ),
                        "timeout",
                    )
                }
            }
        } else {
            (
                RpcResponse::error(
                    &id,
                    errors::METHOD_NOT_FOUND,
                    format!("Method '{method}' not found"),
                ),
                "method_not_found",
            )
        };

        counter!("subagent_rpc_requests_total", "method" => method.clone(), "outcome" => outcome)
            .increment(1);
        histogram!("subagent_rpc_duration_seconds", "method" => method)
            .record(start.elapsed().as_secs_f64());

        response
    }

    /// Check whether a method is registered.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}
