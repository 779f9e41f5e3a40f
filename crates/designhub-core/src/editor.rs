//! Capability interface of the external visual editor.
//!
//! The editor itself (rendering, drag and drop, HTML generation) lives
//! outside this workspace. The session coordinator only needs to hand it a
//! document, ask for the current state back, and hear about edits.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::design::DesignDocument;
use crate::error::Result;

/// Callback invoked on every user-visible change in the editor.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned when registering a [`ChangeListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Adapter over a visual design editor instance.
///
/// Production adapters wrap the real widget; loading a document may itself
/// fire change notifications, which the session coordinator discards.
#[async_trait]
pub trait DesignEditor: Send + Sync {
    /// Replaces the editor's content with `document`.
    async fn load(&self, document: &DesignDocument) -> Result<()>;

    /// Serializes the editor's current state. The result is not normalized.
    async fn serialize(&self) -> Result<Value>;

    /// Renders the current state as a final HTML document.
    async fn export_html(&self) -> Result<String>;

    fn add_change_listener(&self, listener: ChangeListener) -> ListenerId;

    fn remove_change_listener(&self, id: ListenerId);
}
