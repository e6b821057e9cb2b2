//! StopCoordinator — ownership-checked, idempotent run cancellation.
//!
//! Terminates one delegated subagent run by ID, coordinating the inbound
//! message queue and the embedded execution engine through injected
//! collaborator traits. Every rejection path is read-only; registry and
//! engine state only change on the success path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use tracing::{info, instrument, warn};

use courier_core::{EngineSessionId, RunId, SessionKey};

use crate::registry::RunRegistry;

/// Boxed collaborator error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator traits
// ─────────────────────────────────────────────────────────────────────────────

/// Pending inbound messages for a session.
#[async_trait]
pub trait InboundQueue: Send + Sync {
    /// Drop every queued message addressed to the session. Must succeed
    /// trivially when nothing is queued.
    async fn clear_queue(&self, session_key: &SessionKey) -> Result<(), BoxError>;
}

/// Maps session keys to engine session IDs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up the engine session ID bound to the session key, if any.
    async fn resolve_engine_session(
        &self,
        session_key: &SessionKey,
    ) -> Result<Option<EngineSessionId>, BoxError>;
}

/// The embedded execution engine.
#[async_trait]
pub trait EngineAbort: Send + Sync {
    /// Signal abort for an engine session. Returns whether anything was
    /// actually interrupted; callers treat `false` as informational.
    async fn abort_session(&self, engine_session_id: &EngineSessionId) -> Result<bool, BoxError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes and errors
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a stop attempt. Every variant is a normal outcome reported to
/// the caller, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// The run was live and has been stopped.
    Stopped,
    /// No record exists for the run ID.
    NotFound,
    /// The run exists but already ended.
    AlreadyEnded,
    /// The requester does not own the run.
    Forbidden,
    /// The run never got a child session bound; there is nothing to abort.
    NoChildSession,
}

impl StopOutcome {
    /// Whether the stop actually happened.
    #[must_use]
    pub fn stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Stable reason string for rejections, `None` for success.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Stopped => None,
            Self::NotFound => Some("not_found"),
            Self::AlreadyEnded => Some("already_ended"),
            Self::Forbidden => Some("forbidden"),
            Self::NoChildSession => Some("no_child_session"),
        }
    }
}

/// Infrastructure failures during a stop. Rejections are never errors;
/// these surface only when a collaborator itself fails.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Inbound queue clear failed.
    #[error("inbound queue failure: {0}")]
    Queue(#[source] BoxError),

    /// Session store lookup failed.
    #[error("session store failure: {0}")]
    Store(#[source] BoxError),

    /// Engine abort failed.
    #[error("engine abort failure: {0}")]
    Engine(#[source] BoxError),
}

// ─────────────────────────────────────────────────────────────────────────────
// StopCoordinator
// ─────────────────────────────────────────────────────────────────────────────

/// Stops delegated runs on request.
///
/// All stop attempts are serialized through one async mutex so a duplicate
/// request cannot interleave with the check-act-mark sequence and observe
/// the run as still live after another request already signalled the
/// engine.
pub struct StopCoordinator {
    runs: Arc<RunRegistry>,
    queue: Arc<dyn InboundQueue>,
    sessions: Arc<dyn SessionStore>,
    engine: Arc<dyn EngineAbort>,
    stop_lock: tokio::sync::Mutex<()>,
}

impl StopCoordinator {
    /// Create a coordinator over the shared registry and collaborators.
    pub fn new(
        runs: Arc<RunRegistry>,
        queue: Arc<dyn InboundQueue>,
        sessions: Arc<dyn SessionStore>,
        engine: Arc<dyn EngineAbort>,
    ) -> Self {
        Self {
            runs,
            queue,
            sessions,
            engine,
            stop_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Stop one run by ID.
    ///
    /// Checks run in a fixed order, reporting the first that fails:
    /// existence, liveness, ownership (only when `requester` is supplied),
    /// child-session presence. Only when all pass does any state change:
    /// the session's inbound queue is cleared, the engine is signalled,
    /// and the run is marked ended. A second stop for the same run then
    /// reports [`StopOutcome::AlreadyEnded`] without touching the engine.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn stop_run_by_id(
        &self,
        run_id: &RunId,
        requester: Option<&SessionKey>,
    ) -> Result<StopOutcome, CoordinatorError> {
        let _guard = self.stop_lock.lock().await;

        let Some(record) = self.runs.get(run_id) else {
            counter!("subagent_stop_total", "outcome" => "not_found").increment(1);
            return Ok(StopOutcome::NotFound);
        };

        if record.ended_at.is_some() {
            counter!("subagent_stop_total", "outcome" => "already_ended").increment(1);
            return Ok(StopOutcome::AlreadyEnded);
        }

        if let Some(requester) = requester {
            if *requester != record.requester_session_key {
                warn!(
                    requester = %requester,
                    owner = %record.requester_session_key,
                    "stop refused: requester does not own run"
                );
                counter!("subagent_stop_total", "outcome" => "forbidden").increment(1);
                return Ok(StopOutcome::Forbidden);
            }
        }

        if record.child_session_key.is_empty() {
            counter!("subagent_stop_total", "outcome" => "no_child_session").increment(1);
            return Ok(StopOutcome::NoChildSession);
        }

        // All checks passed. Clear queued input first so nothing restarts
        // the turn after the abort lands.
        self.queue
            .clear_queue(&record.child_session_key)
            .await
            .map_err(CoordinatorError::Queue)?;

        match self
            .sessions
            .resolve_engine_session(&record.child_session_key)
            .await
            .map_err(CoordinatorError::Store)?
        {
            Some(engine_session_id) => {
                let interrupted = self
                    .engine
                    .abort_session(&engine_session_id)
                    .await
                    .map_err(CoordinatorError::Engine)?;
                info!(
                    engine_session = %engine_session_id,
                    interrupted,
                    "engine abort signalled"
                );
            }
            None => {
                // Registry state stays authoritative: the run is still
                // marked ended even when the store no longer knows the
                // session.
                warn!(
                    child_session = %record.child_session_key,
                    "no engine session resolved; skipping abort"
                );
            }
        }

        let _ = self.runs.mark_ended(run_id, Utc::now());
        counter!("subagent_stop_total", "outcome" => "stopped").increment(1);
        info!("run stopped");
        Ok(StopOutcome::Stopped)
    }

    /// Stop every live run owned by the requester. Returns the IDs of the
    /// runs that were actually stopped; rejected attempts are skipped.
    pub async fn stop_runs_for_requester(
        &self,
        requester: &SessionKey,
    ) -> Result<Vec<RunId>, CoordinatorError> {
        let mut stopped = Vec::new();
        for record in self.runs.list_by_requester(requester) {
            if record.ended_at.is_some() {
                continue;
            }
            let outcome = self
                .stop_run_by_id(&record.run_id, Some(requester))
                .await?;
            if outcome.stopped() {
                stopped.push(record.run_id);
            }
        }
        Ok(stopped)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
