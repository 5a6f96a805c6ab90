//! OCAP recorder: wires the dispatcher, caches and storage backend together.
//!
//! - [`cache`]: entity and marker lookups used to resolve later events.
//! - [`command`]: the command tags and their dispatch discipline.
//! - [`manager`]: one handler per command tag.
//! - [`recorder`]: the [`Recorder`] facade the game-side entry point calls.
//! - [`config`]: environment-driven [`RecorderConfig`].

pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod manager;
pub mod recorder;

pub use cache::{EntityCache, MarkerCache};
pub use command::Command;
pub use config::{ConfigError, LogFormat, RecorderConfig};
pub use error::WorkerError;
pub use manager::Manager;
pub use recorder::Recorder;
