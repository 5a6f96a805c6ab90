//! Storage backends for recorded missions.
//!
//! The worker talks only to the [`Backend`] trait. [`MemoryBackend`]
//! accumulates one mission in memory and writes a single JSON artifact
//! (optionally gzipped) when the mission ends.

pub mod backend;
pub mod error;
pub mod memory;

pub use backend::Backend;
pub use error::StorageError;
pub use memory::{MemoryBackend, MemoryConfig, MissionSnapshot};
