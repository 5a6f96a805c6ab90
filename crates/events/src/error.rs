use crate::dispatcher::HandlerError;

/// Errors returned from [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered for the command tag.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The command's queue was at capacity and its policy drops.
    #[error("Queue full for command {0}")]
    QueueFull(String),

    /// The dispatcher has been shut down.
    #[error("Dispatcher is shut down")]
    Shutdown,

    /// A synchronous handler returned an error.
    #[error("Handler for {command} failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: HandlerError,
    },
}
