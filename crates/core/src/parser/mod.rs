//! Argument parsers, one per command.
//!
//! Every parser is a pure function from the raw argument list to a typed
//! record. None of them consult a cache or a backend: ids are emitted raw
//! and the worker classifies or resolves them. The only side effect is a
//! `tracing::warn!` when a malformed sub-record is skipped or a lenient
//! field falls back to its default.

mod combat;
mod entity;
mod event;
mod marker;
mod mission;

pub use combat::{parse_fired, parse_hit, parse_kill, parse_projectile, ParsedProjectile};
pub use entity::{parse_soldier, parse_soldier_state, parse_vehicle, parse_vehicle_state};
pub use event::{
    parse_ace3_death, parse_ace3_unconscious, parse_chat, parse_fps, parse_general_event,
    parse_radio, parse_time_state,
};
pub use marker::{parse_marker_create, parse_marker_delete, parse_marker_move, ParsedMarkerMove};
pub use mission::parse_mission;

#[cfg(test)]
pub(crate) fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
