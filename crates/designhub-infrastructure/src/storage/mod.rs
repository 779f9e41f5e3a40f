pub mod atomic_file;
pub mod dir_store;
pub mod memory_store;

pub use atomic_file::{AtomicFile, AtomicFileError};
pub use dir_store::DirKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
