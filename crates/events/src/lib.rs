//! Command dispatch for the OCAP recorder.
//!
//! - [`Event`]: one invocation, a command tag plus its raw arguments.
//! - [`Dispatcher`]: the command → handler registry. Handlers run either
//!   synchronously on the caller's task or through a bounded per-command
//!   queue drained by one background task.
//! - [`DispatchError`]: what a caller can observe from [`Dispatcher::dispatch`].

pub mod dispatcher;
pub mod error;
pub mod event;

pub use dispatcher::{handler, Backpressure, Discipline, Dispatcher, Handler, HandlerError, HandlerResult};
pub use error::DispatchError;
pub use event::Event;
