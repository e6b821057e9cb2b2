//! In-memory run registry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use metrics::gauge;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use courier_core::{RunId, SessionKey};

/// What happens to the child session once its run completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CleanupMode {
    /// Keep the child session after completion.
    #[default]
    Keep,
    /// Delete the child session after completion.
    Delete,
}

/// One delegated subagent run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentRunRecord {
    /// Opaque unique run identifier (primary key).
    pub run_id: RunId,
    /// Session the delegated run executes within. May be empty, meaning no
    /// session was ever bound; such a run can only be marked ended, never
    /// actively aborted.
    pub child_session_key: SessionKey,
    /// Owner of the run, used for authorization.
    pub requester_session_key: SessionKey,
    /// Presentation-only copy of the requester key.
    pub requester_display_key: String,
    /// Task description.
    pub task: String,
    /// Child session cleanup policy.
    #[serde(default)]
    pub cleanup: CleanupMode,
    /// When the run was accepted.
    pub created_at: DateTime<Utc>,
    /// When the run ended. Presence means terminal; once set it is never
    /// cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SubagentRunRecord {
    /// Create a fresh (not yet ended) record.
    #[must_use]
    pub fn new(
        run_id: impl Into<RunId>,
        child_session_key: impl Into<SessionKey>,
        requester_session_key: impl Into<SessionKey>,
        task: impl Into<String>,
    ) -> Self {
        let requester_session_key = requester_session_key.into();
        Self {
            run_id: run_id.into(),
            child_session_key: child_session_key.into(),
            requester_display_key: requester_session_key.as_str().to_owned(),
            requester_session_key,
            task: task.into(),
            cleanup: CleanupMode::Keep,
            created_at: Utc::now(),
            ended_at: None,
        }
    }
}

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A record with this run ID is already registered.
    #[error("duplicate run id: {0}")]
    DuplicateRunId(RunId),
}

/// Process-wide table of delegated runs, keyed by run ID.
///
/// Constructed once per process and passed by reference to the coordinator
/// and entry adapters. The single mutex covers every read-modify-write
/// sequence, so two concurrent stop attempts cannot both observe a run as
/// not-yet-ended.
pub struct RunRegistry {
    runs: Mutex<HashMap<RunId, SubagentRunRecord>>,
}

impl RunRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a new record. Fails if the run ID already exists.
    pub fn register(&self, record: SubagentRunRecord) -> Result<(), RegistryError> {
        let mut runs = self.runs.lock();
        if runs.contains_key(&record.run_id) {
            return Err(RegistryError::DuplicateRunId(record.run_id));
        }
        info!(run_id = %record.run_id, requester = %record.requester_session_key, "run registered");
        let _ = runs.insert(record.run_id.clone(), record);
        Self::update_gauge(&runs);
        Ok(())
    }

    /// Pure lookup, no side effects.
    #[must_use]
    pub fn get(&self, run_id: &RunId) -> Option<SubagentRunRecord> {
        self.runs.lock().get(run_id).cloned()
    }

    /// Mark a run ended. Idempotent: if the run is already ended the
    /// existing timestamp wins and is returned unchanged. Returns `None`
    /// when the run is unknown.
    pub fn mark_ended(&self, run_id: &RunId, ended_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut runs = self.runs.lock();
        let record = runs.get_mut(run_id)?;
        if let Some(existing) = record.ended_at {
            debug!(run_id = %run_id, "run already ended");
            return Some(existing);
        }
        record.ended_at = Some(ended_at);
        Self::update_gauge(&runs);
        Some(ended_at)
    }

    /// Every registered record, ended or not.
    #[must_use]
    pub fn list_all(&self) -> Vec<SubagentRunRecord> {
        self.runs.lock().values().cloned().collect()
    }

    /// All records owned by the given requester, ended or not.
    #[must_use]
    pub fn list_by_requester(&self, requester: &SessionKey) -> Vec<SubagentRunRecord> {
        self.runs
            .lock()
            .values()
            .filter(|r| r.requester_session_key == *requester)
            .cloned()
            .collect()
    }

    /// Number of registered runs that have not ended.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.runs
            .lock()
            .values()
            .filter(|r| r.ended_at.is_none())
            .count()
    }

    /// Clear the table atomically. Test/teardown hook.
    pub fn reset_all(&self) {
        let mut runs = self.runs.lock();
        runs.clear();
        Self::update_gauge(&runs);
    }

    fn update_gauge(runs: &HashMap<RunId, SubagentRunRecord>) {
        let active = runs.values().filter(|r| r.ended_at.is_none()).count();
        #[allow(clippy::cast_precision_loss)]
        gauge!("subagent_runs_active").set(active as f64);
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(run_id: &str) -> SubagentRunRecord {
        SubagentRunRecord::new(run_id, "agent:main:subagent:child-1", "telegram:owner", "do a thing")
    }

    #[test]
    fn register_and_get() {
        let reg = RunRegistry::new();
        reg.register(make_record("abc")).unwrap();

        let record = reg.get(&RunId::from("abc")).unwrap();
        assert_eq!(record.run_id.as_str(), "abc");
        assert_eq!(record.requester_session_key.as_str(), "telegram:owner");
        assert_eq!(record.requester_display_key, "telegram:owner");
        assert!(record.ended_at.is_none());
    }

    #[test]
    fn get_unknown_returns_none() {
        let reg = RunRegistry::new();
        assert!(reg.get(&RunId::from("missing")).is_none());
    }

    #[test]
    fn register_duplicate_rejected() {
        let reg = RunRegistry::new();
        reg.register(make_record("abc")).unwrap();

        let err = reg.register(make_record("abc")).unwrap_err();
        assert!(err.to_string().contains("duplicate run id"));
    }

    #[test]
    fn mark_ended_sets_timestamp() {
        let reg = RunRegistry::new();
        reg.register(make_record("abc")).unwrap();

        let ts = Utc::now();
        let result = reg.mark_ended(&RunId::from("abc"), ts);
        assert_eq!(result, Some(ts));
        assert_eq!(reg.get(&RunId::from("abc")).unwrap().ended_at, Some(ts));
    }

    #[test]
    fn mark_ended_first_write_wins() {
        let reg = RunRegistry::new();
        reg.register(make_record("abc")).unwrap();

        let first = Utc::now();
        let _ = reg.mark_ended(&RunId::from("abc"), first);

        let later = first + chrono::Duration::seconds(30);
        let result = reg.mark_ended(&RunId::from("abc"), later);
        assert_eq!(result, Some(first));
        assert_eq!(reg.get(&RunId::from("abc")).unwrap().ended_at, Some(first));
    }

    #[test]
    fn mark_ended_unknown_returns_none() {
        let reg = RunRegistry::new();
        assert!(reg.mark_ended(&RunId::from("missing"), Utc::now()).is_none());
    }

    #[test]
    fn list_by_requester_filters_owner() {
        let reg = RunRegistry::new();
        reg.register(make_record("r1")).unwrap();
        reg.register(make_record("r2")).unwrap();
        reg.register(SubagentRunRecord::new(
            "r3",
            "agent:main:subagent:child-9",
            "telegram:other",
            "other task",
        ))
        .unwrap();

        let owned = reg.list_by_requester(&SessionKey::from("telegram:owner"));
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|r| r.requester_display_key == "telegram:owner"));
    }

    #[test]
    fn list_by_requester_includes_ended_runs() {
        let reg = RunRegistry::new();
        reg.register(make_record("r1")).unwrap();
        let _ = reg.mark_ended(&RunId::from("r1"), Utc::now());

        let owned = reg.list_by_requester(&SessionKey::from("telegram:owner"));
        assert_eq!(owned.len(), 1);
        assert!(owned[0].ended_at.is_some());
    }

    #[test]
    fn list_all_returns_every_record() {
        let reg = RunRegistry::new();
        reg.register(make_record("r1")).unwrap();
        reg.register(make_record("r2")).unwrap();
        let _ = reg.mark_ended(&RunId::from("r2"), Utc::now());

        assert_eq!(reg.list_all().len(), 2);
    }

    #[test]
    fn active_count_excludes_ended() {
        let reg = RunRegistry::new();
        reg.register(make_record("r1")).unwrap();
        reg.register(make_record("r2")).unwrap();
        assert_eq!(reg.active_count(), 2);

        let _ = reg.mark_ended(&RunId::from("r1"), Utc::now());
        assert_eq!(reg.active_count(), 1);
    }

    #[test]
    fn reset_all_clears_table() {
        let reg = RunRegistry::new();
        reg.register(make_record("r1")).unwrap();
        reg.reset_all();

        assert!(reg.get(&RunId::from("r1")).is_none());
        assert_eq!(reg.active_count(), 0);
    }

    #[test]
    fn ended_run_still_resolvable() {
        // "not found" and "existed but ended" must stay distinguishable.
        let reg = RunRegistry::new();
        reg.register(make_record("r1")).unwrap();
        let _ = reg.mark_ended(&RunId::from("r1"), Utc::now());

        assert!(reg.get(&RunId::from("r1")).is_some());
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = make_record("abc");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"runId\":\"abc\""));
        let back: SubagentRunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn cleanup_mode_defaults_to_keep() {
        assert_eq!(CleanupMode::default(), CleanupMode::Keep);
        assert_eq!(make_record("x").cleanup, CleanupMode::Keep);
    }
}
