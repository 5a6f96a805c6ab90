//! Typed records produced by the parsers and stored by backends.
//!
//! Registrations ([`Soldier`], [`Vehicle`], [`Marker`]) are inserted once.
//! State and event records are append-only and reference a registration by
//! object id or marker id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Frame, MarkerId, ObjectId, Position2D, Position3D, TrajectoryPoint};

// ---------------------------------------------------------------------------
// Mission
// ---------------------------------------------------------------------------

/// Map the mission is played on. Immutable for the mission's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub world_name: String,
    pub display_name: String,
    pub world_size: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub author: String,
    pub workshop_id: String,
}

/// A loaded addon: `[name, workshopId]` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    pub workshop_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableSlots {
    pub east: u8,
    pub west: u8,
    pub independent: u8,
    pub civilian: u8,
    pub logic: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideFriendly {
    pub east_west: bool,
    pub east_independent: bool,
    pub west_independent: bool,
}

/// The single active mission. Every record ingested belongs to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub mission_name: String,
    pub mission_name_source: String,
    pub briefing_name: String,
    pub on_load_name: String,
    pub author: String,
    pub server_name: String,
    pub server_profile: String,
    pub tag: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// Seconds between sampled frames.
    pub capture_delay: f32,
    pub addon_version: String,
    pub extension_version: String,
    /// Build identifier of the recorder binary.
    pub extension_build: String,
    pub addons: Vec<Addon>,
    pub playable_slots: PlayableSlots,
    pub side_friendly: SideFriendly,
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soldier {
    pub object_id: ObjectId,
    pub join_frame: Frame,
    pub unit_name: String,
    pub group_id: String,
    pub side: String,
    pub is_player: bool,
    pub role_description: String,
    pub class_name: String,
    pub display_name: String,
    /// Empty for AI units.
    pub player_uid: String,
    pub squad_params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub object_id: ObjectId,
    pub join_frame: Frame,
    /// Viewer category such as `car`, `heli`, `tank`.
    pub ocap_type: String,
    pub display_name: String,
    pub class_name: String,
    pub customization: String,
}

/// Where a marker sits. Which branch is populated follows the marker's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkerGeometry {
    Point(Position3D),
    Polyline(Vec<Position2D>),
}

pub const SHAPE_POLYLINE: &str = "POLYLINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Assigned by the backend on insert; 0 until then.
    pub id: MarkerId,
    pub marker_name: String,
    pub capture_frame: Frame,
    pub direction: f32,
    pub marker_type: String,
    pub text: String,
    /// Creating player's object id, `-1` for system markers.
    pub owner_id: i64,
    pub color: String,
    /// Free-form `[w,h]`.
    pub size: String,
    pub side: String,
    /// `ICON`, `ELLIPSE`, `RECTANGLE` or `POLYLINE`.
    pub shape: String,
    pub geometry: MarkerGeometry,
    pub alpha: f32,
    pub brush: String,
    /// Set by a delete; `None` while the marker persists.
    pub end_frame: Option<Frame>,
}

// ---------------------------------------------------------------------------
// State samples
// ---------------------------------------------------------------------------

/// Player scoreboard: infantry, vehicle, armor, air kills, deaths, total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub infantry_kills: u8,
    pub vehicle_kills: u8,
    pub armor_kills: u8,
    pub air_kills: u8,
    pub deaths: u8,
    pub total_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldierState {
    pub soldier_id: ObjectId,
    pub capture_frame: Frame,
    pub position: Position3D,
    pub bearing: u16,
    /// 0 alive, 1 incapacitated, 2 dead.
    pub lifestate: u8,
    pub in_vehicle: bool,
    pub unit_name: String,
    pub is_player: bool,
    pub current_role: String,
    pub has_stable_vitals: bool,
    pub is_dragged_carried: bool,
    pub scores: Scores,
    pub vehicle_role: String,
    pub in_vehicle_object_id: Option<ObjectId>,
    pub stance: String,
    pub group_id: String,
    pub side: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub vehicle_id: ObjectId,
    pub capture_frame: Frame,
    pub position: Position3D,
    pub bearing: u16,
    pub is_alive: bool,
    /// JSON array of occupants, kept exactly as received.
    pub crew: String,
    pub fuel: f32,
    pub damage: f32,
    pub engine_on: bool,
    pub locked: bool,
    pub side: String,
    pub vector_dir: String,
    pub vector_up: String,
    pub turret_azimuth: f32,
    pub turret_elevation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerState {
    pub marker_id: MarkerId,
    pub capture_frame: Frame,
    pub position: Position3D,
    pub direction: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeState {
    pub capture_frame: Frame,
    /// ISO8601, UTC.
    pub system_time_utc: String,
    pub mission_date: String,
    pub time_multiplier: f32,
    /// Seconds since mission start.
    pub mission_time: f32,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A classified reference to a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Soldier(ObjectId),
    Vehicle(ObjectId),
}

impl EntityRef {
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Soldier(id) | Self::Vehicle(id) => *id,
        }
    }

    pub fn soldier_id(&self) -> Option<ObjectId> {
        match self {
            Self::Soldier(id) => Some(*id),
            Self::Vehicle(_) => None,
        }
    }

    pub fn vehicle_id(&self) -> Option<ObjectId> {
        match self {
            Self::Vehicle(id) => Some(*id),
            Self::Soldier(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredEvent {
    pub soldier_id: ObjectId,
    pub capture_frame: Frame,
    pub weapon: String,
    pub magazine: String,
    pub firing_mode: String,
    pub start_position: Position3D,
    pub end_position: Position3D,
}

/// A projectile hit as sent by the game, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProjectileHit {
    pub entity_id: ObjectId,
    pub components: Vec<String>,
    pub position: Position3D,
    pub capture_frame: Frame,
}

/// A projectile hit whose target was found in the entity cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileHit {
    pub target: EntityRef,
    pub components: Vec<String>,
    pub position: Position3D,
    pub capture_frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileEvent {
    pub firer_id: ObjectId,
    pub vehicle_id: Option<ObjectId>,
    pub vehicle_role: String,
    pub remote_controller_id: Option<ObjectId>,
    pub capture_frame: Frame,
    pub weapon: String,
    pub weapon_display: String,
    pub muzzle: String,
    pub muzzle_display: String,
    pub magazine: String,
    pub magazine_display: String,
    pub ammo: String,
    pub fire_mode: String,
    pub trajectory: Vec<TrajectoryPoint>,
    pub initial_velocity: String,
    pub hits: Vec<ProjectileHit>,
    /// Engine simulation class such as `shotBullet` or `shotGrenade`.
    pub simulation_type: String,
    pub is_submunition: bool,
    pub magazine_icon: String,
}

/// `(vehicle, weapon, magazine)` as sent in hit/kill events. Any part may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDescriptor {
    pub vehicle: String,
    pub weapon: String,
    pub magazine: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    pub capture_frame: Frame,
    pub victim: EntityRef,
    pub shooter: Option<EntityRef>,
    pub weapon: WeaponDescriptor,
    pub event_text: String,
    pub distance: f32,
}

impl HitEvent {
    pub fn victim_soldier_id(&self) -> Option<ObjectId> {
        self.victim.soldier_id()
    }

    pub fn victim_vehicle_id(&self) -> Option<ObjectId> {
        self.victim.vehicle_id()
    }

    pub fn shooter_soldier_id(&self) -> Option<ObjectId> {
        self.shooter.and_then(|s| s.soldier_id())
    }

    pub fn shooter_vehicle_id(&self) -> Option<ObjectId> {
        self.shooter.and_then(|s| s.vehicle_id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    pub capture_frame: Frame,
    pub victim: EntityRef,
    pub killer: Option<EntityRef>,
    pub weapon: WeaponDescriptor,
    pub event_text: String,
    pub distance: f32,
}

impl KillEvent {
    pub fn victim_soldier_id(&self) -> Option<ObjectId> {
        self.victim.soldier_id()
    }

    pub fn victim_vehicle_id(&self) -> Option<ObjectId> {
        self.victim.vehicle_id()
    }

    pub fn killer_soldier_id(&self) -> Option<ObjectId> {
        self.killer.and_then(|k| k.soldier_id())
    }

    pub fn killer_vehicle_id(&self) -> Option<ObjectId> {
        self.killer.and_then(|k| k.vehicle_id())
    }
}

/// Hit or kill as sent by the game: ids not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCombatEvent {
    pub capture_frame: Frame,
    pub victim_id: ObjectId,
    pub attacker_id: ObjectId,
    pub weapon: WeaponDescriptor,
    pub event_text: String,
    pub distance: f32,
}

/// Named chat channels. Wire indices 6..=15 are mod-defined custom channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatChannel {
    Global,
    Side,
    Command,
    Group,
    Vehicle,
    Direct,
    System,
    Custom,
}

impl ChatChannel {
    pub fn from_index(index: i64) -> Self {
        match index {
            0 => Self::Global,
            1 => Self::Side,
            2 => Self::Command,
            3 => Self::Group,
            4 => Self::Vehicle,
            5 => Self::Direct,
            6..=15 => Self::Custom,
            _ => Self::System,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Side => "Side",
            Self::Command => "Command",
            Self::Group => "Group",
            Self::Vehicle => "Vehicle",
            Self::Direct => "Direct",
            Self::System => "System",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub capture_frame: Frame,
    /// `None` for system messages.
    pub sender_id: Option<ObjectId>,
    pub channel: ChatChannel,
    pub from_name: String,
    pub sender_name: String,
    pub message: String,
    pub player_uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioEvent {
    pub capture_frame: Frame,
    pub sender_id: Option<ObjectId>,
    pub radio: String,
    pub radio_type: String,
    /// `start` or `end` of a transmission.
    pub start_end: String,
    pub channel: i8,
    pub is_additional: bool,
    pub frequency: f32,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralEvent {
    pub capture_frame: Frame,
    pub name: String,
    pub message: String,
    pub extra_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerFpsEvent {
    pub capture_frame: Frame,
    pub fps_average: f32,
    pub fps_min: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ace3DeathEvent {
    pub capture_frame: Frame,
    pub soldier_id: ObjectId,
    pub reason: String,
    pub last_damage_source: Option<EntityRef>,
}

/// ACE3 death as sent by the game: the damage source is not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAce3DeathEvent {
    pub capture_frame: Frame,
    pub soldier_id: ObjectId,
    pub reason: String,
    pub last_damage_source_id: Option<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ace3UnconsciousEvent {
    pub capture_frame: Frame,
    pub soldier_id: ObjectId,
    pub is_unconscious: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_channel_table() {
        assert_eq!(ChatChannel::from_index(0), ChatChannel::Global);
        assert_eq!(ChatChannel::from_index(5), ChatChannel::Direct);
        assert_eq!(ChatChannel::from_index(6), ChatChannel::Custom);
        assert_eq!(ChatChannel::from_index(15), ChatChannel::Custom);
        assert_eq!(ChatChannel::from_index(16), ChatChannel::System);
        assert_eq!(ChatChannel::from_index(-3), ChatChannel::System);
        assert_eq!(ChatChannel::from_index(99).to_string(), "System");
    }

    #[test]
    fn entity_ref_sides_are_exclusive() {
        let s = EntityRef::Soldier(5);
        assert_eq!(s.soldier_id(), Some(5));
        assert_eq!(s.vehicle_id(), None);
        let v = EntityRef::Vehicle(20);
        assert_eq!(v.vehicle_id(), Some(20));
        assert_eq!(v.soldier_id(), None);
        assert_eq!(v.object_id(), 20);
    }
}
