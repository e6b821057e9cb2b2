//! Event reconciler for the displayed conversation.
//!
//! Consumes the unordered interleave of chat and activity events across
//! all runs and reduces it to one coherent presentation: forwarded
//! render calls for the displayed session, a single debounced
//! [`ActivityStatus`], and history refreshes for completions that did
//! not originate from the local user.
//!
//! Status precedence, highest first: terminal chat state, active tool
//! hold, lifecycle "running", chat "streaming". The tool hold is a
//! time-boxed window (`tool_status_hold_ms`) during which streaming and
//! running requests are suppressed so a short tool call stays visible
//! instead of flickering away.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use courier_core::{
    ActivityEvent, ActivityPhase, ActivityStream, ChatEvent, ChatState, RunId, SessionKey,
    ToolCallId,
};

use crate::settings::{ClientSettings, Verbosity};
use crate::status::ActivityStatus;

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator traits
// ─────────────────────────────────────────────────────────────────────────────

/// Renders chat content and tool call indicators.
pub trait ChatRenderer: Send + Sync {
    /// Append streamed assistant text for a run.
    fn append_delta(&self, run_id: &RunId, text: &str);
    /// Finalize the assistant message for a run.
    fn finalize(&self, run_id: &RunId, text: &str);
    /// Append a system notice.
    fn append_notice(&self, text: &str);
    /// Show a tool call starting.
    fn tool_start(&self, call: &ToolCallDisplay);
    /// Show a tool call's output.
    fn tool_result(&self, result: &ToolResultDisplay);
}

/// Requests a UI redraw.
pub trait RenderRequester: Send + Sync {
    /// Ask the UI to repaint. Called at most once per accepted event.
    fn request_redraw(&self);
}

/// Reloads conversation history from the source of truth.
pub trait HistoryRefresher: Send + Sync {
    /// Trigger a history reload.
    fn refresh(&self);
}

/// Receives the debounced activity status.
pub trait StatusSink: Send + Sync {
    /// Replace the displayed status.
    fn set_status(&self, status: ActivityStatus);
}

// ─────────────────────────────────────────────────────────────────────────────
// Display payloads
// ─────────────────────────────────────────────────────────────────────────────

/// A tool call indicator forwarded to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallDisplay {
    /// Run the call belongs to.
    pub run_id: RunId,
    /// Tool call ID.
    pub tool_call_id: Option<ToolCallId>,
    /// Tool name.
    pub tool_name: String,
    /// Arguments; omitted below the informative verbosity tier.
    pub arguments: Option<Value>,
}

/// A tool result forwarded to the renderer.
///
/// `content` is emptied below the full verbosity tier; `block_count` and
/// the error flag always pass through so the indicator can still show
/// shape and failure.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolResultDisplay {
    /// Run the result belongs to.
    pub run_id: RunId,
    /// Tool call ID.
    pub tool_call_id: Option<ToolCallId>,
    /// Output content blocks, possibly redacted.
    pub content: Vec<Value>,
    /// Number of blocks in the original event.
    pub block_count: usize,
    /// Whether the tool reported an error.
    pub is_error: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconciler
// ─────────────────────────────────────────────────────────────────────────────

struct State {
    session_key: SessionKey,
    active_run: Option<RunId>,
    local_runs: HashSet<RunId>,
    hold_until: Option<Instant>,
    timer_generation: u64,
    timer_cancel: Option<CancellationToken>,
}

impl State {
    fn hold_active(&self, now: Instant) -> bool {
        self.hold_until.is_some_and(|until| now < until)
    }

    /// Cancel any pending fallback timer and invalidate late firings.
    fn cancel_timer(&mut self) {
        self.timer_generation += 1;
        if let Some(token) = self.timer_cancel.take() {
            token.cancel();
        }
    }

    fn clear_hold(&mut self) {
        self.hold_until = None;
        self.cancel_timer();
    }
}

enum ActivityAction {
    ToolStart {
        display: ToolCallDisplay,
        status: ActivityStatus,
    },
    ToolResult {
        display: ToolResultDisplay,
        status: Option<ActivityStatus>,
    },
    Running {
        suppressed: bool,
    },
    Bookkeeping,
}

/// Folds multiplexed run events into one view for the displayed session.
pub struct Reconciler {
    settings: ClientSettings,
    renderer: Arc<dyn ChatRenderer>,
    redraw: Arc<dyn RenderRequester>,
    history: Arc<dyn HistoryRefresher>,
    status: Arc<dyn StatusSink>,
    state: Arc<Mutex<State>>,
}

impl Reconciler {
    /// Create a reconciler with no session displayed yet.
    pub fn new(
        settings: ClientSettings,
        renderer: Arc<dyn ChatRenderer>,
        redraw: Arc<dyn RenderRequester>,
        history: Arc<dyn HistoryRefresher>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            settings,
            renderer,
            redraw,
            history,
            status,
            state: Arc::new(Mutex::new(State {
                session_key: SessionKey::from(""),
                active_run: None,
                local_runs: HashSet::new(),
                hold_until: None,
                timer_generation: 0,
                timer_cancel: None,
            })),
        }
    }

    /// Switch the displayed session. Clears the run binding, the local
    /// run set, and any pending hold so events for the old run stop
    /// matching.
    pub fn set_session(&self, session_key: impl Into<SessionKey>) {
        let session_key = session_key.into();
        let mut s = self.state.lock();
        if s.session_key == session_key {
            return;
        }
        debug!(session = %session_key, "displayed session changed");
        s.session_key = session_key;
        s.active_run = None;
        s.local_runs.clear();
        s.clear_hold();
    }

    /// Record a run as originated by local user action. Finals for local
    /// runs do not trigger a history refresh.
    pub fn note_local_run(&self, run_id: impl Into<RunId>) {
        let _ = self.state.lock().local_runs.insert(run_id.into());
    }

    /// The run currently bound to the displayed session, if any.
    pub fn active_run(&self) -> Option<RunId> {
        self.state.lock().active_run.clone()
    }

    /// Handle a chat-turn event.
    ///
    /// Events for other sessions are ignored entirely. The first chat
    /// event seen while no run is bound establishes the binding.
    pub fn handle_chat(&self, ev: &ChatEvent) {
        let (status, refresh) = {
            let mut s = self.state.lock();
            if ev.session_key != s.session_key {
                return;
            }
            if s.active_run.is_none() {
                s.active_run = Some(ev.run_id.clone());
            }
            let now = Instant::now();
            match &ev.state {
                ChatState::Delta { .. } => {
                    let status = if s.hold_active(now) {
                        None
                    } else {
                        Some(ActivityStatus::Streaming)
                    };
                    (status, false)
                }
                ChatState::Final { .. } => {
                    s.clear_hold();
                    let refresh = !s.local_runs.contains(&ev.run_id);
                    (Some(ActivityStatus::Idle), refresh)
                }
                ChatState::Aborted => {
                    s.clear_hold();
                    (Some(ActivityStatus::Aborted), false)
                }
                ChatState::Error { .. } => {
                    s.clear_hold();
                    (Some(ActivityStatus::Failed), false)
                }
            }
        };

        match &ev.state {
            ChatState::Delta { text } => self.renderer.append_delta(&ev.run_id, text),
            ChatState::Final { text } => self.renderer.finalize(&ev.run_id, text),
            ChatState::Aborted => self.renderer.append_notice("Run aborted"),
            ChatState::Error { message } => self.renderer.append_notice(message),
        }
        if let Some(status) = status {
            self.status.set_status(status);
        }
        if refresh {
            self.history.refresh();
        }
        self.redraw.request_redraw();
    }

    /// Handle an agent-activity event.
    ///
    /// Accepted only when the event's run ID equals the bound run;
    /// anything else is dropped with no side effects.
    pub fn handle_activity(&self, ev: &ActivityEvent) {
        let action = {
            let mut s = self.state.lock();
            if s.active_run.as_ref() != Some(&ev.run_id) {
                return;
            }
            let now = Instant::now();
            match (ev.stream, ev.phase) {
                (ActivityStream::Tool, ActivityPhase::Start) => {
                    let hold = Duration::from_millis(self.settings.tool_status_hold_ms);
                    s.hold_until = Some(now + hold);
                    s.cancel_timer();
                    let name = ev.tool_name.clone().unwrap_or_default();
                    ActivityAction::ToolStart {
                        display: ToolCallDisplay {
                            run_id: ev.run_id.clone(),
                            tool_call_id: ev.tool_call_id.clone(),
                            tool_name: name.clone(),
                            arguments: if self.settings.verbosity >= Verbosity::Informative {
                                ev.arguments.clone()
                            } else {
                                None
                            },
                        },
                        status: ActivityStatus::Tool { name },
                    }
                }
                (
                    ActivityStream::Tool,
                    ActivityPhase::Update | ActivityPhase::Result,
                ) => {
                    let status = match s.hold_until {
                        // Hold still active: fall back to "running" at the
                        // hold's own deadline.
                        Some(until) if now < until => {
                            self.arm_fallback(&mut s, until);
                            None
                        }
                        // Result landed after the hold elapsed; demote now.
                        Some(_) => {
                            s.clear_hold();
                            Some(ActivityStatus::Running)
                        }
                        None => None,
                    };
                    ActivityAction::ToolResult {
                        status,
                        display: ToolResultDisplay {
                            run_id: ev.run_id.clone(),
                            tool_call_id: ev.tool_call_id.clone(),
                            content: if self.settings.verbosity >= Verbosity::Full {
                                ev.content.clone()
                            } else {
                                Vec::new()
                            },
                            block_count: ev.content.len(),
                            is_error: ev.is_error,
                        },
                    }
                }
                (ActivityStream::Lifecycle, ActivityPhase::Start) => ActivityAction::Running {
                    suppressed: s.hold_active(now),
                },
                _ => ActivityAction::Bookkeeping,
            }
        };

        match action {
            ActivityAction::ToolStart { display, status } => {
                self.renderer.tool_start(&display);
                self.status.set_status(status);
            }
            ActivityAction::ToolResult { display, status } => {
                self.renderer.tool_result(&display);
                if let Some(status) = status {
                    self.status.set_status(status);
                }
            }
            ActivityAction::Running { suppressed } => {
                if !suppressed {
                    self.status.set_status(ActivityStatus::Running);
                }
            }
            ActivityAction::Bookkeeping => {}
        }
        self.redraw.request_redraw();
    }

    /// Arm the hold fallback timer, replacing any pending one.
    ///
    /// The deadline is the hold's absolute expiry, captured here so that
    /// task scheduling delay cannot push the fallback past it.
    fn arm_fallback(&self, s: &mut State, deadline: Instant) {
        s.cancel_timer();
        let generation = s.timer_generation;
        let cancel = CancellationToken::new();
        s.timer_cancel = Some(cancel.clone());

        let state = Arc::clone(&self.state);
        let status = Arc::clone(&self.status);
        let _ = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    let current = state.lock().timer_generation == generation;
                    if current {
                        status.set_status(ActivityStatus::Running);
                    }
                }
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
