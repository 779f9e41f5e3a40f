//! Editing sessions.
//!
//! A session ties one editor instance to the design repository: it picks the
//! document to load, autosaves edits after a quiet period into a temporary
//! slot, and commits named saves.

mod coordinator;
mod event;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{SessionCoordinator, SessionServices};
pub use event::{LoadSource, NoticeLevel, SessionEvent, SessionNotice, SessionPhase, SessionStatus};
pub use scheduler::{Scheduler, TimerSlot, TimerTask, TokioScheduler};
