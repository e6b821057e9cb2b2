//! # courier-client
//!
//! Client-side presentation layer for multiplexed agent event streams.
//!
//! Many delegated runs can emit chat and activity events concurrently;
//! the [`Reconciler`] folds that unordered interleave into one coherent
//! view for the conversation currently on screen: forwarded render
//! calls, a single debounced [`ActivityStatus`], and history refreshes
//! for completions that originated elsewhere.

#![deny(unsafe_code)]

pub mod reconciler;
pub mod settings;
pub mod status;

pub use reconciler::{
    ChatRenderer, HistoryRefresher, Reconciler, RenderRequester, StatusSink, ToolCallDisplay,
    ToolResultDisplay,
};
pub use settings::{ClientSettings, SettingsError, Verbosity, load_client_settings};
pub use status::ActivityStatus;
