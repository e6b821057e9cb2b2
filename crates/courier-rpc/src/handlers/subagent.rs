//! Subagent run management handlers.
//!
//! These methods sit on the trusted control-plane surface, so the stop
//! path passes no requester key and the coordinator's ownership check is
//! skipped. Any authenticated client may stop any run; clients that need
//! scoping use `subagent.stopAll` with an explicit session key.

use async_trait::async_trait;
use serde_json::{Value, json};

use courier_core::{RunId, SessionKey};

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// `subagent.stop` — stop one run by ID.
pub struct StopRunHandler;

#[async_trait]
impl MethodHandler for StopRunHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let run_id = RunId::from(require_string_param(params.as_ref(), "runId")?);

        let outcome = ctx
            .coordinator
            .stop_run_by_id(&run_id, None)
            .await
            .map_err(|e| RpcError::Internal {
                message: format!("Failed to stop run: {e}"),
            })?;

        let mut result = json!({
            "runId": run_id.as_str(),
            "stopped": outcome.stopped(),
        });
        if let Some(reason) = outcome.reason() {
            result["reason"] = json!(reason);
        }
        Ok(result)
    }
}

/// `subagent.stopAll` — stop every live run owned by a session.
pub struct StopAllHandler;

#[async_trait]
impl MethodHandler for StopAllHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let requester = SessionKey::from(require_string_param(params.as_ref(), "sessionKey")?);

        let stopped = ctx
            .coordinator
            .stop_runs_for_requester(&requester)
            .await
            .map_err(|e| RpcError::Internal {
                message: format!("Failed to stop runs: {e}"),
            })?;

        let ids: Vec<&str> = stopped.iter().map(RunId::as_str).collect();
        Ok(json!({"stoppedRunIds": ids}))
    }
}

/// `subagent.list` — list registered runs, optionally filtered by owner.
pub struct ListRunsHandler;

#[async_trait]
impl MethodHandler for ListRunsHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let filter = params
            .as_ref()
            .and_then(|p| p.get("sessionKey"))
            .and_then(Value::as_str)
            .map(SessionKey::from);

        let records = match filter {
            Some(key) => ctx.runs.list_by_requester(&key),
            None => ctx.runs.list_all(),
        };

        let runs = serde_json::to_value(&records).map_err(|e| RpcError::Internal {
            message: format!("Failed to serialize runs: {e}"),
        })?;
        Ok(json!({
            "runs": runs,
            "activeCount": ctx.runs.active_count(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_helpers::make_test_context;
    use chrono::Utc;
    use courier_runs::SubagentRunRecord;

    fn register_run(ctx: &RpcContext, run_id: &str, requester: &str) {
        ctx.runs
            .register(SubagentRunRecord::new(
                run_id,
                "agent:main:subagent:child-1",
                requester,
                "task",
            ))
            .unwrap();
    }

    #[tokio::test]
    async fn stop_missing_run_id_is_invalid_request() {
        let ctx = make_test_context();
        let err = StopRunHandler.handle(Some(json!({})), &ctx).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn stop_blank_run_id_is_invalid_request() {
        let ctx = make_test_context();
        let err = StopRunHandler
            .handle(Some(json!({"runId": ""})), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn stop_unknown_run_reports_not_found_reason() {
        let ctx = make_test_context();
        let result = StopRunHandler
            .handle(Some(json!({"runId": "ghost"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result["stopped"], false);
        assert_eq!(result["reason"], "not_found");
    }

    #[tokio::test]
    async fn stop_live_run_succeeds_without_ownership_check() {
        let ctx = make_test_context();
        register_run(&ctx, "run-1", "telegram:owner");

        let result = StopRunHandler
            .handle(Some(json!({"runId": "run-1"})), &ctx)
            .await
            .unwrap();

        assert_eq!(result["stopped"], true);
        assert!(result.get("reason").is_none());
        assert!(
            ctx.runs
                .get(&RunId::from("run-1"))
                .unwrap()
                .ended_at
                .is_some()
        );
    }

    #[tokio::test]
    async fn repeat_stop_reports_already_ended() {
        let ctx = make_test_context();
        register_run(&ctx, "run-1", "telegram:owner");

        let _ = StopRunHandler
            .handle(Some(json!({"runId": "run-1"})), &ctx)
            .await
            .unwrap();
        let second = StopRunHandler
            .handle(Some(json!({"runId": "run-1"})), &ctx)
            .await
            .unwrap();

        assert_eq!(second["stopped"], false);
        assert_eq!(second["reason"], "already_ended");
    }

    #[tokio::test]
    async fn stop_all_requires_session_key() {
        let ctx = make_test_context();
        let err = StopAllHandler.handle(None, &ctx).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn stop_all_stops_only_owned_runs() {
        let ctx = make_test_context();
        register_run(&ctx, "run-1", "telegram:owner");
        register_run(&ctx, "run-2", "telegram:other");

        let result = StopAllHandler
            .handle(Some(json!({"sessionKey": "telegram:owner"})), &ctx)
            .await
            .unwrap();

        let ids = result["stoppedRunIds"].as_array().unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0], "run-1");
        assert!(
            ctx.runs
                .get(&RunId::from("run-2"))
                .unwrap()
                .ended_at
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_filters_by_session_key() {
        let ctx = make_test_context();
        register_run(&ctx, "run-1", "telegram:owner");
        register_run(&ctx, "run-2", "telegram:other");

        let result = ListRunsHandler
            .handle(Some(json!({"sessionKey": "telegram:owner"})), &ctx)
            .await
            .unwrap();

        let runs = result["runs"].as_array().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0]["runId"], "run-1");
        assert_eq!(result["activeCount"], 2);
    }

    #[tokio::test]
    async fn list_without_filter_returns_all() {
        let ctx = make_test_context();
        register_run(&ctx, "run-1", "telegram:owner");
        register_run(&ctx, "run-2", "telegram:other");

        let result = ListRunsHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["runs"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_reflects_ended_state() {
        let ctx = make_test_context();
        register_run(&ctx, "run-1", "telegram:owner");
        let _ = ctx.runs.mark_ended(&RunId::from("run-1"), Utc::now());

        let result = ListRunsHandler
            .handle(Some(json!({"sessionKey": "telegram:owner"})), &ctx)
            .await
            .unwrap();

        let runs = result["runs"].as_array().unwrap();
        assert!(runs[0].get("endedAt").is_some());
        assert_eq!(result["activeCount"], 0);
    }
}
