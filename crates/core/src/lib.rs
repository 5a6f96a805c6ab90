//! OCAP recorder domain core.
//!
//! Everything in this crate is synchronous and free of shared state:
//!
//! - [`types`]: frame numbers, object ids and coordinates.
//! - [`model`]: registration, state and event records produced by parsing.
//! - [`wire`]: low-level helpers for the string arguments the game sends.
//! - [`parser`]: one function per command, turning an argument list into a record.
//! - [`error`]: [`ParseError`], the single error kind parsers return.

pub mod error;
pub mod model;
pub mod parser;
pub mod types;
pub mod wire;

pub use error::ParseError;
pub use types::{Frame, MarkerId, ObjectId, Position2D, Position3D, TrajectoryPoint};
