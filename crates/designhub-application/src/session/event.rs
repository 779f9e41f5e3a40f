//! Session events and observable status.

use serde::{Deserialize, Serialize};

/// Input to a session's event loop.
///
/// Editor callbacks and timers never touch the coordinator directly; they
/// post one of these into the session's channel and the owner handles them
/// in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The editor finished initializing.
    EditorReady,
    /// The editor reported a change.
    EditorChanged,
    /// The post-load settle delay elapsed.
    SettleElapsed,
    /// An autosave debounce timer fired. Only the latest generation counts.
    DebounceElapsed { generation: u64 },
    /// The session should shut down.
    Teardown,
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Closed,
}

/// Where the document loaded into the editor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    /// The named record for the session's design id.
    Stored,
    /// The session's autosave slot.
    AutoSave,
    /// The default template.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-visible message posted by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl SessionNotice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    /// Change notifications are being discarded.
    pub suppressed: bool,
    /// Edits exist that have not been committed to a named design.
    pub dirty: bool,
    /// Name of the design being edited, once known.
    pub display_name: Option<String>,
    /// Overlay label while a long-running action is in progress.
    pub busy: Option<String>,
    pub notice: Option<SessionNotice>,
}

impl SessionStatus {
    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }
}
