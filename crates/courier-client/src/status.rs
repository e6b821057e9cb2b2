//! Activity status values shown for the displayed conversation.

use serde::{Deserialize, Serialize};

/// The single debounced status signal for the active conversation.
///
/// Precedence, highest first: terminal states ([`Aborted`], [`Failed`],
/// [`Idle`] after a final), an active tool hold ([`Tool`]), [`Running`],
/// [`Streaming`]. Arbitration happens in the reconciler; this type just
/// names the values.
///
/// [`Aborted`]: ActivityStatus::Aborted
/// [`Failed`]: ActivityStatus::Failed
/// [`Idle`]: ActivityStatus::Idle
/// [`Tool`]: ActivityStatus::Tool
/// [`Running`]: ActivityStatus::Running
/// [`Streaming`]: ActivityStatus::Streaming
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ActivityStatus {
    /// Nothing in flight.
    Idle,
    /// Assistant text is streaming in.
    Streaming,
    /// The agent is working between visible outputs.
    Running,
    /// A tool is executing.
    Tool {
        /// Name of the running tool.
        name: String,
    },
    /// The turn was aborted.
    Aborted,
    /// The turn failed.
    Failed,
}
