//! Event wire format for the client-side reconciler.
//!
//! Two event families arrive multiplexed over one connection, keyed by run
//! ID and session key:
//!
//! - **[`ChatEvent`]**: chat-turn events for a conversation — streamed
//!   content deltas, the final message, and terminal states.
//! - **[`ActivityEvent`]**: agent activity — tool execution phases and
//!   lifecycle boundaries for a specific run.
//!
//! Both are transient (never persisted) and drive real-time UI updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{RunId, SessionKey, ToolCallId};

// ─────────────────────────────────────────────────────────────────────────────
// ChatEvent — chat-turn events
// ─────────────────────────────────────────────────────────────────────────────

/// State carried by a [`ChatEvent`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ChatState {
    /// Incremental assistant text.
    Delta {
        /// Text fragment.
        text: String,
    },

    /// Turn completed; full assistant text.
    Final {
        /// Complete message text.
        text: String,
    },

    /// Turn was aborted before completion.
    Aborted,

    /// Turn failed.
    Error {
        /// Human-readable error message.
        message: String,
    },
}

impl ChatState {
    /// Whether this state ends the turn (no further chat events follow
    /// for this run).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Delta { .. })
    }
}

/// A chat-turn event for one conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// Run this event belongs to.
    pub run_id: RunId,
    /// Conversation the run is rendered into.
    pub session_key: SessionKey,
    /// Turn state.
    #[serde(flatten)]
    pub state: ChatState,
}

impl ChatEvent {
    /// Build a delta event.
    #[must_use]
    pub fn delta(
        run_id: impl Into<RunId>,
        session_key: impl Into<SessionKey>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            session_key: session_key.into(),
            state: ChatState::Delta { text: text.into() },
        }
    }

    /// Build a final event.
    #[must_use]
    pub fn r#final(
        run_id: impl Into<RunId>,
        session_key: impl Into<SessionKey>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            session_key: session_key.into(),
            state: ChatState::Final { text: text.into() },
        }
    }

    /// Build an aborted event.
    #[must_use]
    pub fn aborted(run_id: impl Into<RunId>, session_key: impl Into<SessionKey>) -> Self {
        Self {
            run_id: run_id.into(),
            session_key: session_key.into(),
            state: ChatState::Aborted,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActivityEvent — tool / lifecycle activity
// ─────────────────────────────────────────────────────────────────────────────

/// Which activity stream an [`ActivityEvent`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityStream {
    /// Tool execution events.
    Tool,
    /// Agent lifecycle boundaries.
    Lifecycle,
}

/// Phase within an activity stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityPhase {
    /// Stream element started.
    Start,
    /// Intermediate progress.
    Update,
    /// Tool produced its result.
    Result,
    /// Stream element ended.
    End,
}

/// An agent-activity event for one run.
///
/// Tool fields are only populated for `stream == Tool`; lifecycle events
/// carry the run ID and phase alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Run this event belongs to.
    pub run_id: RunId,
    /// Activity stream.
    pub stream: ActivityStream,
    /// Phase within the stream.
    pub phase: ActivityPhase,
    /// Tool call ID (tool stream only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,
    /// Tool name (tool stream only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool arguments (tool start only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    /// Tool output content blocks (tool update/result only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Value>,
    /// Whether the tool reported an error (tool result only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ActivityEvent {
    /// Build a tool-start event.
    #[must_use]
    pub fn tool_start(
        run_id: impl Into<RunId>,
        tool_call_id: impl Into<ToolCallId>,
        tool_name: impl Into<String>,
        arguments: Option<Value>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            stream: ActivityStream::Tool,
            phase: ActivityPhase::Start,
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
            arguments,
            content: Vec::new(),
            is_error: None,
        }
    }

    /// Build a tool-result event.
    #[must_use]
    pub fn tool_result(
        run_id: impl Into<RunId>,
        tool_call_id: impl Into<ToolCallId>,
        content: Vec<Value>,
        is_error: bool,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            stream: ActivityStream::Tool,
            phase: ActivityPhase::Result,
            tool_call_id: Some(tool_call_id.into()),
            tool_name: None,
            arguments: None,
            content,
            is_error: Some(is_error),
        }
    }

    /// Build a lifecycle event.
    #[must_use]
    pub fn lifecycle(run_id: impl Into<RunId>, phase: ActivityPhase) -> Self {
        Self {
            run_id: run_id.into(),
            stream: ActivityStream::Lifecycle,
            phase,
            tool_call_id: None,
            tool_name: None,
            arguments: None,
            content: Vec::new(),
            is_error: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
