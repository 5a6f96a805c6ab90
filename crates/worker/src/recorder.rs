//! The entry point the game-side extension calls into.

use std::sync::Arc;

use ocap_events::{DispatchError, Dispatcher, Event};
use ocap_storage::{Backend, MemoryBackend, StorageError};

use crate::cache::{EntityCache, MarkerCache};
use crate::config::RecorderConfig;
use crate::manager::Manager;

/// Owns the dispatcher, caches, manager and backend for one process.
///
/// Created once via [`Recorder::start`]; cheap to share behind an `Arc`.
pub struct Recorder {
    dispatcher: Dispatcher,
    manager: Arc<Manager>,
    backend: Arc<MemoryBackend>,
}

impl Recorder {
    /// Build the in-memory backend, initialise it and register every handler.
    pub async fn start(config: RecorderConfig) -> Result<Self, StorageError> {
        let backend = Arc::new(MemoryBackend::new(config.memory_config()));
        backend.init().await?;

        let manager = Arc::new(Manager::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            Arc::new(EntityCache::new()),
            Arc::new(MarkerCache::new()),
            config.extension_version.clone(),
            config.extension_build.clone(),
        ));

        let dispatcher = Dispatcher::new();
        manager.register_handlers(&dispatcher, &config).await;

        tracing::info!(
            extension_version = %config.extension_version,
            output_dir = %config.output_dir.display(),
            "Recorder started"
        );

        Ok(Self {
            dispatcher,
            manager,
            backend,
        })
    }

    /// Route one invocation. Buffered commands answer `""` once queued.
    pub async fn dispatch(&self, command: &str, args: Vec<String>) -> Result<String, DispatchError> {
        self.dispatcher.dispatch(Event::new(command, args)).await
    }

    pub fn backend(&self) -> &Arc<MemoryBackend> {
        &self.backend
    }

    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Drain every buffered queue, then close the backend.
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        self.dispatcher.shutdown().await;
        self.backend.close().await?;
        tracing::info!("Recorder shut down");
        Ok(())
    }
}
