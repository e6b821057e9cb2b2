//! `StopSubagent` tool — terminates a delegated subagent run.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use courier_core::RunId;
use courier_runs::{StopCoordinator, StopOutcome};

use crate::errors::ToolError;
use crate::traits::{
    CourierTool, Tool, ToolContext, ToolOutput, ToolParameterSchema, error_output, require_string,
    text_output,
};

/// The `StopSubagent` tool stops one of the requesting agent's own
/// delegated runs.
///
/// The requester identity is always taken from the invocation context, so
/// a model cannot stop runs it does not own by fabricating parameters.
pub struct StopSubagentTool {
    coordinator: Arc<StopCoordinator>,
}

impl StopSubagentTool {
    /// Create the tool over the shared coordinator.
    pub fn new(coordinator: Arc<StopCoordinator>) -> Self {
        Self { coordinator }
    }
}

#[async_trait]
impl CourierTool for StopSubagentTool {
    fn name(&self) -> &str {
        "StopSubagent"
    }

    fn definition(&self) -> Tool {
        Tool {
            name: "StopSubagent".into(),
            description: "Stop one of your delegated subagent runs by its run ID. \
Clears the run's pending input and interrupts its execution. Stopping a run \
that already finished reports alreadyEnded; you can only stop runs you \
started."
                .into(),
            parameters: ToolParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = serde_json::Map::new();
                    let _ = m.insert(
                        "runId".into(),
                        json!({"type": "string", "description": "ID of the run to stop"}),
                    );
                    m
                }),
                required: Some(vec!["runId".into()]),
            },
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let run_id = match require_string(&params, "runId") {
            Ok(id) => RunId::from(id),
            Err(out) => return Ok(out),
        };

        let outcome = match self
            .coordinator
            .stop_run_by_id(&run_id, Some(&ctx.session_key))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Ok(error_output(format!("Failed to stop run: {e}"))),
        };

        info!(run_id = %run_id, ?outcome, "stop tool completed");

        // Rejections are reported under their reason string, not as tool
        // errors; `status: "error"` stays reserved for a malformed call.
        let message = match &outcome {
            StopOutcome::Stopped => format!("Stopped run {run_id}"),
            StopOutcome::NotFound => format!("No run found with ID {run_id}"),
            StopOutcome::AlreadyEnded => format!("Run {run_id} already ended"),
            StopOutcome::Forbidden => format!("Run {run_id} belongs to another session"),
            StopOutcome::NoChildSession => {
                format!("Run {run_id} has no child session yet; nothing to stop")
            }
        };
        Ok(text_output(
            message,
            Some(json!({
                "status": outcome.reason().unwrap_or("stopped"),
                "stopped": outcome.stopped(),
                "runId": run_id.as_str(),
            })),
        ))
    }
}
