//! Assembly of the mission artifact consumed by the web viewer.
//!
//! The root object and entities are typed; per-tick positions, events and
//! markers are heterogeneous arrays and are emitted as JSON values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use ocap_core::model::{
    GeneralEvent, HitEvent, KillEvent, MarkerGeometry, Mission, ProjectileEvent, SoldierState,
    TimeState, VehicleState, World,
};
use ocap_core::types::{ObjectId, Position3D};
use ocap_core::wire::format_weapon_text;

use super::{MarkerRecord, MissionData, SoldierRecord, VehicleRecord};

const SIM_BULLET: &str = "shotBullet";
const SIM_GRENADE: &str = "shotGrenade";
const WEAPON_THROW: &str = "throw";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub addon_version: String,
    pub extension_version: String,
    pub extension_build: String,
    pub mission_name: String,
    pub mission_author: String,
    pub world_name: String,
    pub end_frame: u32,
    pub capture_delay: f32,
    /// The mission tag, e.g. `COOP` or `TvT`.
    pub tags: String,
    pub times: Vec<TimeExport>,
    pub entities: Vec<EntitySlot>,
    pub events: Vec<Value>,
    #[serde(rename = "Markers")]
    pub markers: Vec<Value>,
}

/// Mission clock sample used by the viewer to map frames to in-game time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeExport {
    pub date: String,
    pub frame_num: u32,
    #[serde(rename = "systemTimeUTC")]
    pub system_time_utc: String,
    pub time: f32,
    pub time_multiplier: f32,
}

impl From<&TimeState> for TimeExport {
    fn from(state: &TimeState) -> Self {
        Self {
            date: state.mission_date.clone(),
            frame_num: state.capture_frame,
            system_time_utc: state.system_time_utc.clone(),
            time: state.mission_time,
            time_multiplier: state.time_multiplier,
        }
    }
}

/// A slot of the sparse `entities` array. Unused ids hold `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntitySlot {
    Entity(EntityExport),
    Placeholder {},
}

impl EntitySlot {
    pub fn entity(&self) -> Option<&EntityExport> {
        match self {
            Self::Entity(e) => Some(e),
            Self::Placeholder {} => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityExport {
    pub id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    pub side: String,
    pub is_player: u8,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    pub start_frame_num: u32,
    pub positions: Vec<Value>,
    pub frames_fired: Vec<Value>,
}

/// Build the artifact for `mission` from everything recorded so far.
pub fn build_export(mission: &Mission, world: &World, data: &MissionData) -> Export {
    let mut entities = entity_slots(data);

    let mut events = Vec::with_capacity(
        data.general_events.len() + data.hit_events.len() + data.kill_events.len(),
    );
    events.extend(data.general_events.iter().map(general_event));
    events.extend(data.hit_events.iter().map(hit_event));
    events.extend(data.kill_events.iter().map(kill_event));

    let mut markers: Vec<Value> = data.markers.values().map(marker).collect();

    for projectile in &data.projectile_events {
        if is_projectile_marker(projectile) {
            markers.push(projectile_marker(projectile, data));
        } else if let Some(line) = projectile_fire_line(projectile) {
            if let Some(EntitySlot::Entity(firer)) =
                entities.get_mut(usize::from(projectile.firer_id))
            {
                firer.frames_fired.push(line);
            }
        }
        events.extend(projectile_hits(projectile));
    }

    Export {
        addon_version: mission.addon_version.clone(),
        extension_version: mission.extension_version.clone(),
        extension_build: mission.extension_build.clone(),
        mission_name: mission.mission_name.clone(),
        mission_author: mission.author.clone(),
        world_name: world.world_name.clone(),
        end_frame: data.end_frame(),
        capture_delay: mission.capture_delay,
        tags: mission.tag.clone(),
        times: data.time_states.iter().map(TimeExport::from).collect(),
        entities,
        events,
        markers,
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

fn entity_slots(data: &MissionData) -> Vec<EntitySlot> {
    let max_id = data
        .soldiers
        .keys()
        .chain(data.vehicles.keys())
        .copied()
        .max();

    let Some(max_id) = max_id else {
        return Vec::new();
    };

    let mut slots = vec![EntitySlot::Placeholder {}; usize::from(max_id) + 1];
    for record in data.soldiers.values() {
        slots[usize::from(record.soldier.object_id)] = EntitySlot::Entity(soldier_entity(record));
    }
    for record in data.vehicles.values() {
        slots[usize::from(record.vehicle.object_id)] = EntitySlot::Entity(vehicle_entity(record));
    }
    slots
}

fn soldier_entity(record: &SoldierRecord) -> EntityExport {
    let soldier = &record.soldier;
    EntityExport {
        id: soldier.object_id,
        name: soldier.unit_name.clone(),
        group: soldier.group_id.clone(),
        side: soldier.side.clone(),
        is_player: u8::from(soldier.is_player),
        entity_type: "unit".to_string(),
        role: soldier.role_description.clone(),
        class: String::new(),
        start_frame_num: soldier.join_frame,
        positions: record.states.iter().map(soldier_position).collect(),
        frames_fired: record
            .fired_events
            .iter()
            .map(|f| {
                json!([
                    f.capture_frame,
                    xy(&f.end_position),
                    xy(&f.start_position),
                    f.weapon,
                    f.magazine,
                    f.firing_mode,
                ])
            })
            .collect(),
    }
}

fn vehicle_entity(record: &VehicleRecord) -> EntityExport {
    let vehicle = &record.vehicle;
    EntityExport {
        id: vehicle.object_id,
        name: vehicle.display_name.clone(),
        group: String::new(),
        side: "UNKNOWN".to_string(),
        is_player: 0,
        entity_type: vehicle.ocap_type.clone(),
        role: String::new(),
        class: vehicle.class_name.clone(),
        start_frame_num: vehicle.join_frame,
        positions: record.states.iter().map(vehicle_position).collect(),
        frames_fired: Vec::new(),
    }
}

fn soldier_position(state: &SoldierState) -> Value {
    json!([
        xy(&state.position),
        state.bearing,
        viewer_lifestate(state.lifestate),
        state.in_vehicle_object_id.unwrap_or(0),
        state.unit_name,
        u8::from(state.is_player),
        state.current_role,
    ])
}

fn vehicle_position(state: &VehicleState) -> Value {
    let crew = match serde_json::from_str::<Value>(&state.crew) {
        Ok(crew @ Value::Array(_)) => crew,
        _ => json!([]),
    };
    json!([
        xy(&state.position),
        state.bearing,
        u8::from(state.is_alive),
        crew,
    ])
}

/// Game lifestate (0 alive, 1 incapacitated, 2 dead) to viewer lifestate.
fn viewer_lifestate(lifestate: u8) -> u8 {
    match lifestate {
        0 => 1,
        1 => 2,
        2 => 0,
        _ => 1,
    }
}

fn xy(p: &Position3D) -> Value {
    json!([p.x, p.y])
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

fn general_event(event: &GeneralEvent) -> Value {
    // Structured messages are inlined so the viewer sees arrays and objects.
    let message = if event.message.starts_with('[') || event.message.starts_with('{') {
        serde_json::from_str::<Value>(&event.message)
            .unwrap_or_else(|_| Value::String(event.message.clone()))
    } else {
        Value::String(event.message.clone())
    };
    json!([event.capture_frame, event.name, message])
}

fn hit_event(event: &HitEvent) -> Value {
    json!([
        event.capture_frame,
        "hit",
        event.victim.object_id(),
        [event.shooter.map_or(0, |s| s.object_id()), event.event_text],
        event.distance,
    ])
}

fn kill_event(event: &KillEvent) -> Value {
    json!([
        event.capture_frame,
        "killed",
        event.victim.object_id(),
        [event.killer.map_or(0, |k| k.object_id()), event.event_text],
        event.distance,
    ])
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

fn marker(record: &MarkerRecord) -> Value {
    let m = &record.marker;
    let positions: Vec<Value> = match &m.geometry {
        MarkerGeometry::Polyline(points) => {
            let coords: Vec<Value> = points.iter().map(|p| json!([p.x, p.y])).collect();
            vec![json!([m.capture_frame, coords, m.direction, m.alpha])]
        }
        MarkerGeometry::Point(position) => std::iter::once(json!([
            m.capture_frame,
            xy(position),
            m.direction,
            m.alpha
        ]))
        .chain(record.states.iter().map(|s| {
            json!([s.capture_frame, xy(&s.position), s.direction, s.alpha])
        }))
        .collect(),
    };

    let end_frame = m.end_frame.map_or(-1, i64::from);

    json!([
        m.marker_type,
        m.text.strip_prefix('#').unwrap_or(&m.text),
        m.capture_frame,
        end_frame,
        m.owner_id,
        m.color.strip_prefix('#').unwrap_or(&m.color),
        side_index(&m.side),
        positions,
        marker_size(&m.size),
        m.shape,
        m.brush,
    ])
}

/// Viewer side index: -1 is global.
pub(crate) fn side_index(side: &str) -> i8 {
    match side.to_ascii_uppercase().as_str() {
        "EAST" | "OPFOR" => 0,
        "WEST" | "BLUFOR" => 1,
        "GUER" | "INDEPENDENT" => 2,
        "CIV" | "CIVILIAN" => 3,
        _ => -1,
    }
}

/// `"[w,h]"` to `[w, h]`, falling back to `[1, 1]`.
pub(crate) fn marker_size(size: &str) -> [f64; 2] {
    match serde_json::from_str::<Vec<f64>>(size) {
        Ok(v) if v.len() == 2 => [v[0], v[1]],
        _ => [1.0, 1.0],
    }
}

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

/// Bullets become fire lines; everything else is drawn as a moving marker.
fn is_projectile_marker(p: &ProjectileEvent) -> bool {
    if p.simulation_type.is_empty() {
        p.weapon == WEAPON_THROW
    } else {
        p.simulation_type != SIM_BULLET
    }
}

fn projectile_fire_line(p: &ProjectileEvent) -> Option<Value> {
    let (first, last) = match p.trajectory.as_slice() {
        [first, .., last] => (first, last),
        _ => return None,
    };
    Some(json!([
        p.capture_frame,
        xy(&last.position),
        xy(&first.position),
        p.weapon,
        p.magazine,
        p.fire_mode,
    ]))
}

fn projectile_marker(p: &ProjectileEvent, data: &MissionData) -> Value {
    let icon = icon_file_name(&p.magazine_icon);
    let (marker_type, color) = if icon.is_empty() {
        ("mil_triangle".to_string(), "ColorRed")
    } else {
        (format!("magIcons/{icon}"), "ColorWhite")
    };

    let text = match p.vehicle_id {
        Some(vehicle_id) if vehicle_id != p.firer_id => {
            let vehicle_name = data
                .vehicles
                .get(&vehicle_id)
                .map(|r| r.vehicle.display_name.as_str())
                .unwrap_or_default();
            format!(
                "{vehicle_name} {} - {}",
                p.muzzle_display, p.magazine_display
            )
        }
        _ if p.simulation_type == SIM_GRENADE || p.weapon == WEAPON_THROW => {
            p.magazine_display.clone()
        }
        _ => format!("{} - {}", p.muzzle_display, p.magazine_display),
    };

    let positions: Vec<Value> = p
        .trajectory
        .iter()
        .map(|t| json!([t.frame, xy(&t.position), 0, 1.0]))
        .collect();

    let end_frame = p.trajectory.last().map_or(-1, |t| i64::from(t.frame));

    json!([
        marker_type,
        text,
        p.capture_frame,
        end_frame,
        p.firer_id,
        color,
        -1,
        positions,
        [1.0, 1.0],
        "ICON",
        "Solid",
    ])
}

fn projectile_hits(p: &ProjectileEvent) -> impl Iterator<Item = Value> + '_ {
    let weapon_name = if p.muzzle_display.is_empty() {
        &p.weapon_display
    } else {
        &p.muzzle_display
    };
    let text = format_weapon_text("", weapon_name, &p.magazine_display);
    let start = p
        .trajectory
        .first()
        .map(|t| t.position)
        .unwrap_or_default();

    p.hits.iter().map(move |hit| {
        json!([
            hit.capture_frame,
            "hit",
            hit.target.object_id(),
            [p.firer_id, text],
            start.distance_2d(&hit.position) as f32,
        ])
    })
}

/// Last path component; game paths use backslashes.
fn icon_file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
