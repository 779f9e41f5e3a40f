//! Application layer for designhub.
//!
//! This crate coordinates editing sessions between the external editor and
//! the domain repositories, and wires infrastructure from configuration.

pub mod bootstrap;
pub mod session;

pub use bootstrap::DesignHub;
pub use session::{SessionCoordinator, SessionServices, SessionStatus};
