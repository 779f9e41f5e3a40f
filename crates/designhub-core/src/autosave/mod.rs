//! Autosave slots: temporary snapshots of an editing session.

mod model;
mod repository;

pub use model::{AutoSaveKey, AutoSaveSnapshot, NEW_DESIGN_SENTINEL};
pub use repository::AutoSaveRepository;
