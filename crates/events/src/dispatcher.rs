//! Command → handler registry with synchronous and buffered invocation.
//!
//! A synchronous handler is awaited inside [`Dispatcher::dispatch`] and its
//! result returned to the caller. A buffered handler is fed through a
//! bounded `tokio::sync::mpsc` channel; one drain task per command calls the
//! handler in enqueue order, logs failures, and survives panics. The caller
//! of a buffered command gets an empty response immediately.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::DispatchError;
use crate::event::Event;

/// Error type handlers return. Anything `Error + Send + Sync` converts via `?`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A handler's outcome: the response string (often empty) or an error.
pub type HandlerResult = Result<String, HandlerError>;

/// A registered handler. Cloned into the drain task for buffered commands.
pub type Handler = Arc<dyn Fn(Event) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |event| f(event).boxed())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// What a buffered dispatch does when the command's queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Suspend the caller until the drain task frees a slot.
    Block,
    /// Drop the event, log it, and return [`DispatchError::QueueFull`].
    DropAndLog,
}

/// How a command's handler is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Sync,
    Buffered {
        depth: usize,
        backpressure: Backpressure,
    },
}

impl Discipline {
    pub fn blocking(depth: usize) -> Self {
        Self::Buffered {
            depth,
            backpressure: Backpressure::Block,
        }
    }

    pub fn dropping(depth: usize) -> Self {
        Self::Buffered {
            depth,
            backpressure: Backpressure::DropAndLog,
        }
    }
}

struct BufferedQueue {
    sender: mpsc::Sender<Event>,
    backpressure: Backpressure,
    drain: JoinHandle<()>,
}

struct Registration {
    handler: Handler,
    queue: Option<BufferedQueue>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Flat registry of command handlers.
///
/// Share it via `Arc<Dispatcher>`. Registration and dispatch may run
/// concurrently from any number of tasks.
pub struct Dispatcher {
    registry: RwLock<HashMap<String, Registration>>,
    /// Drain tasks of queues replaced by a re-registration.
    retired: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            retired: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Register `handler` for `command`, replacing any earlier registration.
    ///
    /// When the previous registration was buffered its queue is closed; the
    /// old drain task finishes what was already enqueued and is awaited by
    /// [`shutdown`](Self::shutdown).
    ///
    /// Must be called from within a Tokio runtime when `discipline` is
    /// buffered, since it spawns the drain task.
    pub async fn register(&self, command: impl Into<String>, handler: Handler, discipline: Discipline) {
        let command = command.into();

        let queue = match discipline {
            Discipline::Sync => None,
            Discipline::Buffered {
                depth,
                backpressure,
            } => {
                let (sender, receiver) = mpsc::channel(depth.max(1));
                let drain = tokio::spawn(drain_queue(
                    command.clone(),
                    Arc::clone(&handler),
                    receiver,
                ));
                Some(BufferedQueue {
                    sender,
                    backpressure,
                    drain,
                })
            }
        };

        let previous = self
            .registry
            .write()
            .await
            .insert(command.clone(), Registration { handler, queue });

        if let Some(BufferedQueue { sender, drain, .. }) = previous.and_then(|r| r.queue) {
            drop(sender);
            self.retired.lock().await.push(drain);
        }

        tracing::debug!(command = %command, ?discipline, "Registered command handler");
    }

    pub async fn has_handler(&self, command: &str) -> bool {
        self.registry.read().await.contains_key(command)
    }

    /// Registered command tags, sorted.
    pub async fn commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = self.registry.read().await.keys().cloned().collect();
        commands.sort();
        commands
    }

    /// Route `event` to its handler.
    ///
    /// Synchronous commands return the handler's response or its error.
    /// Buffered commands return `Ok("")` once the event is enqueued.
    pub async fn dispatch(&self, event: Event) -> Result<String, DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Shutdown);
        }

        // Clone what is needed and release the lock before awaiting a handler
        // or a full queue, so registration is never starved.
        let (handler, queue) = {
            let registry = self.registry.read().await;
            let Some(registration) = registry.get(&event.command) else {
                return Err(DispatchError::UnknownCommand(event.command));
            };
            (
                Arc::clone(&registration.handler),
                registration
                    .queue
                    .as_ref()
                    .map(|q| (q.sender.clone(), q.backpressure)),
            )
        };

        match queue {
            None => invoke_sync(handler, event).await,
            Some((sender, Backpressure::Block)) => {
                sender
                    .send(event)
                    .await
                    .map_err(|_| DispatchError::Shutdown)?;
                Ok(String::new())
            }
            Some((sender, Backpressure::DropAndLog)) => match sender.try_send(event) {
                Ok(()) => Ok(String::new()),
                Err(mpsc::error::TrySendError::Full(event)) => {
                    tracing::warn!(command = %event.command, "Queue full, dropping event");
                    Err(DispatchError::QueueFull(event.command))
                }
                Err(mpsc::error::TrySendError::Closed(_)) => Err(DispatchError::Shutdown),
            },
        }
    }

    /// Close every buffered queue and wait for each drain task to finish.
    ///
    /// Events already enqueued are still handled. Later dispatches fail
    /// with [`DispatchError::Shutdown`].
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        tracing::info!("Shutting down dispatcher");

        let mut drains = Vec::new();
        {
            let mut registry = self.registry.write().await;
            for (command, registration) in registry.drain() {
                if let Some(BufferedQueue { sender, drain, .. }) = registration.queue {
                    drop(sender);
                    drains.push((command, drain));
                }
            }
        }
        drains.extend(
            self.retired
                .lock()
                .await
                .drain(..)
                .map(|drain| (String::from("<replaced>"), drain)),
        );

        for (command, drain) in drains {
            if let Err(e) = drain.await {
                tracing::error!(command = %command, error = %e, "Drain task did not finish cleanly");
            }
        }

        tracing::info!("Dispatcher shut down complete");
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

async fn invoke_sync(handler: Handler, event: Event) -> Result<String, DispatchError> {
    let command = event.command.clone();
    match AssertUnwindSafe(async move { handler(event).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(source)) => Err(DispatchError::Handler { command, source }),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(command = %command, panic = %message, "Handler panicked");
            Err(DispatchError::Handler {
                command,
                source: format!("handler panicked: {message}").into(),
            })
        }
    }
}

/// Drain loop for one buffered command. Ends when every sender is dropped.
async fn drain_queue(command: String, handler: Handler, mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        let handler = Arc::clone(&handler);
        let outcome = AssertUnwindSafe(async move { handler(event).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::warn!(command = %command, error = %e, "Buffered handler failed");
            }
            // The panic hook has already reported the location.
            Err(payload) => {
                tracing::error!(
                    command = %command,
                    panic = %panic_message(payload.as_ref()),
                    "Buffered handler panicked, continuing with next event"
                );
            }
        }
    }
    tracing::debug!(command = %command, "Drain task finished");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn recording_handler(seen: Arc<StdMutex<Vec<String>>>) -> Handler {
        handler(move |event: Event| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(event.args.join(","));
                Ok(String::new())
            }
        })
    }

    #[tokio::test]
    async fn sync_handler_returns_response() {
        let d = Dispatcher::new();
        d.register(
            ":ECHO:",
            handler(|e: Event| async move { Ok(e.args.join("|")) }),
            Discipline::Sync,
        )
        .await;

        let out = d
            .dispatch(Event::from_strs(":ECHO:", &["a", "b"]))
            .await
            .expect("should dispatch");
        assert_eq!(out, "a|b");
        assert!(d.has_handler(":ECHO:").await);
        assert!(!d.has_handler(":NOPE:").await);
    }

    #[tokio::test]
    async fn sync_handler_error_flows_back() {
        let d = Dispatcher::new();
        d.register(
            ":FAIL:",
            handler(|_| async { Err::<String, HandlerError>("bad args".into()) }),
            Discipline::Sync,
        )
        .await;

        let err = d.dispatch(Event::from_strs(":FAIL:", &[])).await.unwrap_err();
        assert_matches!(err, DispatchError::Handler { ref command, .. } if command == ":FAIL:");
        assert!(err.to_string().contains("bad args"));
    }

    #[tokio::test]
    async fn unknown_command() {
        let d = Dispatcher::new();
        assert_matches!(
            d.dispatch(Event::from_strs(":WHAT:", &[])).await,
            Err(DispatchError::UnknownCommand(c)) if c == ":WHAT:"
        );
    }

    #[tokio::test]
    async fn buffered_preserves_dispatch_order() {
        let d = Dispatcher::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        d.register(":STATE:", recording_handler(Arc::clone(&seen)), Discipline::blocking(8))
            .await;

        for i in 0..500 {
            let out = d
                .dispatch(Event::new(":STATE:", vec![i.to_string()]))
                .await
                .expect("should enqueue");
            assert!(out.is_empty());
        }
        d.shutdown().await;

        let seen = seen.lock().unwrap();
        let expected: Vec<String> = (0..500).map(|i| i.to_string()).collect();
        assert_eq!(*seen, expected);
    }

    #[tokio::test]
    async fn buffered_errors_are_swallowed() {
        let d = Dispatcher::new();
        d.register(
            ":BAD:",
            handler(|_| async { Err::<String, HandlerError>("nope".into()) }),
            Discipline::blocking(4),
        )
        .await;
        let out = d.dispatch(Event::from_strs(":BAD:", &[])).await;
        assert_eq!(out.expect("caller is released"), "");
        d.shutdown().await;
    }

    #[tokio::test]
    async fn panic_in_buffered_handler_does_not_stop_the_drain() {
        let d = Dispatcher::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let inner = recording_handler(Arc::clone(&seen));
        d.register(
            ":BOOM:",
            handler(move |e: Event| {
                let inner = Arc::clone(&inner);
                async move {
                    if e.args.first().map(String::as_str) == Some("panic") {
                        panic!("handler exploded");
                    }
                    inner(e).await
                }
            }),
            Discipline::blocking(4),
        )
        .await;

        d.dispatch(Event::from_strs(":BOOM:", &["1"])).await.unwrap();
        d.dispatch(Event::from_strs(":BOOM:", &["panic"])).await.unwrap();
        d.dispatch(Event::from_strs(":BOOM:", &["2"])).await.unwrap();
        d.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn panic_in_sync_handler_becomes_error() {
        let d = Dispatcher::new();
        d.register(
            ":BOOM:",
            handler(|e: Event| async move {
                if e.args.is_empty() {
                    panic!("sync exploded");
                }
                Ok(String::new())
            }),
            Discipline::Sync,
        )
        .await;
        let err = d.dispatch(Event::from_strs(":BOOM:", &[])).await.unwrap_err();
        assert!(err.to_string().contains("sync exploded"));
    }

    #[test]
    fn panic_message_reads_the_payload() {
        let literal = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "static message");

        let formatted = std::panic::catch_unwind(|| panic!("frame {}", 42)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "frame 42");

        let other = std::panic::catch_unwind(|| std::panic::panic_any(7_u32)).unwrap_err();
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn drop_policy_rejects_when_full() {
        let d = Dispatcher::new();
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);
        d.register(
            ":FPS:",
            handler(move |_| {
                let mut release = release_rx.clone();
                async move {
                    let _ = release.wait_for(|go| *go).await;
                    Ok(String::new())
                }
            }),
            Discipline::dropping(1),
        )
        .await;

        // First event is picked up by the drain task and parks; the second
        // fills the single slot; a third cannot fit.
        d.dispatch(Event::from_strs(":FPS:", &["1"])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        d.dispatch(Event::from_strs(":FPS:", &["2"])).await.unwrap();
        assert_matches!(
            d.dispatch(Event::from_strs(":FPS:", &["3"])).await,
            Err(DispatchError::QueueFull(c)) if c == ":FPS:"
        );

        release_tx.send(true).unwrap();
        d.shutdown().await;
    }

    #[tokio::test]
    async fn block_policy_waits_for_capacity() {
        let d = Arc::new(Dispatcher::new());
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let inner = recording_handler(Arc::clone(&seen));
        d.register(
            ":STATE:",
            handler(move |e| {
                let mut release = release_rx.clone();
                let inner = Arc::clone(&inner);
                async move {
                    let _ = release.wait_for(|go| *go).await;
                    inner(e).await
                }
            }),
            Discipline::blocking(1),
        )
        .await;

        d.dispatch(Event::from_strs(":STATE:", &["1"])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        d.dispatch(Event::from_strs(":STATE:", &["2"])).await.unwrap();

        let blocked = {
            let d = Arc::clone(&d);
            tokio::spawn(async move { d.dispatch(Event::from_strs(":STATE:", &["3"])).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished(), "third dispatch should wait for a free slot");

        release_tx.send(true).unwrap();
        blocked.await.unwrap().expect("should enqueue once drained");
        d.shutdown().await;
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn dispatch_after_shutdown_fails() {
        let d = Dispatcher::new();
        d.register(":X:", handler(|_| async { Ok(String::new()) }), Discipline::blocking(2))
            .await;
        d.shutdown().await;
        assert_matches!(
            d.dispatch(Event::from_strs(":X:", &[])).await,
            Err(DispatchError::Shutdown)
        );
    }

    #[tokio::test]
    async fn reregistration_replaces_handler_and_drains_old_queue() {
        let d = Dispatcher::new();
        let first = Arc::new(StdMutex::new(Vec::new()));
        let second = Arc::new(StdMutex::new(Vec::new()));

        d.register(":E:", recording_handler(Arc::clone(&first)), Discipline::blocking(16))
            .await;
        d.dispatch(Event::from_strs(":E:", &["old"])).await.unwrap();

        d.register(":E:", recording_handler(Arc::clone(&second)), Discipline::blocking(16))
            .await;
        d.dispatch(Event::from_strs(":E:", &["new"])).await.unwrap();
        d.shutdown().await;

        assert_eq!(*first.lock().unwrap(), vec!["old".to_string()]);
        assert_eq!(*second.lock().unwrap(), vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn buffered_can_become_sync() {
        let d = Dispatcher::new();
        d.register(":E:", handler(|_| async { Ok("queued".into()) }), Discipline::blocking(4))
            .await;
        d.register(":E:", handler(|_| async { Ok("direct".into()) }), Discipline::Sync)
            .await;
        assert_eq!(d.dispatch(Event::from_strs(":E:", &[])).await.unwrap(), "direct");
        assert_eq!(d.commands().await, vec![":E:".to_string()]);
    }
}
