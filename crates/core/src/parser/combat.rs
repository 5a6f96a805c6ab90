use serde_json::Value;

use crate::error::ParseError;
use crate::model::{FiredEvent, ProjectileEvent, RawCombatEvent, RawProjectileHit, WeaponDescriptor};
use crate::types::{Frame, ObjectId, TrajectoryPoint};
use crate::wire::{
    clean_args, format_weapon_text, parse_bool, parse_f32, parse_frame, parse_object_id,
    parse_optional_object_id, parse_position, parse_sqf_string_array, require_fields, trim_quotes,
};

/// A projectile with its hit parts still unclassified.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedProjectile {
    /// `hits` is always empty here; the worker fills it from `raw_hits`.
    pub event: ProjectileEvent,
    pub raw_hits: Vec<RawProjectileHit>,
}

fn json_frame(value: &Value) -> Option<Frame> {
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as Frame)
}

/// `[[tickTime, frameNo, "x,y,z"], ...]`; unreadable points are skipped.
fn parse_trajectory(raw: &str) -> Result<Vec<TrajectoryPoint>, ParseError> {
    let points: Vec<Vec<Value>> = serde_json::from_str(raw).map_err(|source| {
        ParseError::InvalidJson {
            field: "positions",
            source,
        }
    })?;

    let mut trajectory = Vec::with_capacity(points.len());
    for point in points {
        if point.len() < 3 {
            continue;
        }
        let Some(frame) = json_frame(&point[1]) else {
            tracing::warn!(value = %point[1], "Invalid frame in projectile position");
            continue;
        };
        let Some(pos) = point[2].as_str() else {
            tracing::warn!(value = %point[2], "Invalid projectile position string");
            continue;
        };
        match parse_position(pos) {
            Ok(position) => trajectory.push(TrajectoryPoint { position, frame }),
            Err(e) => tracing::warn!(error = %e, pos, "Skipping projectile position"),
        }
    }
    Ok(trajectory)
}

/// `[[entityId, components, "x,y,z", frameNo], ...]` where `components` is a
/// string or an array of strings. A malformed blob yields no hits.
fn parse_hit_parts(raw: &str) -> Vec<RawProjectileHit> {
    let parts: Vec<Vec<Value>> = match serde_json::from_str(raw) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(error = %e, data = raw, "Error parsing hit parts");
            return Vec::new();
        }
    };

    parts
        .into_iter()
        .filter(|part| part.len() >= 4)
        .filter_map(|part| {
            let entity_id = part[0]
                .as_u64()
                .or_else(|| json_frame(&part[0]).map(u64::from))
                .and_then(|id| ObjectId::try_from(id).ok())?;
            let components = match &part[1] {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            let position = match parse_position(part[2].as_str()?) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, "Error converting hit position");
                    return None;
                }
            };
            let capture_frame = json_frame(&part[3])?;
            Some(RawProjectileHit {
                entity_id,
                components,
                position,
                capture_frame,
            })
        })
        .collect()
}

/// `:PROJECTILE:` 20 positional fields:
///
/// | idx | field              | idx | field            |
/// |-----|--------------------|-----|------------------|
/// | 0   | fired frame        | 10  | magazine         |
/// | 1   | fired time (unused)| 11  | magazine display |
/// | 2   | firer id           | 12  | ammo             |
/// | 3   | vehicle id / -1    | 13  | fire mode        |
/// | 4   | vehicle role       | 14  | trajectory JSON  |
/// | 5   | remote controller  | 15  | initial velocity |
/// | 6   | weapon             | 16  | hit parts JSON   |
/// | 7   | weapon display     | 17  | simulation type  |
/// | 8   | muzzle             | 18  | is submunition   |
/// | 9   | muzzle display     | 19  | magazine icon    |
pub fn parse_projectile(args: &[String]) -> Result<ParsedProjectile, ParseError> {
    require_fields(args, 20)?;
    let data = clean_args(args);

    let event = ProjectileEvent {
        capture_frame: parse_frame(&data[0])?,
        firer_id: parse_object_id("firerId", &data[2])?,
        vehicle_id: parse_optional_object_id("vehicleId", &data[3])?,
        vehicle_role: data[4].clone(),
        remote_controller_id: parse_optional_object_id("remoteControllerId", &data[5])?,
        weapon: data[6].clone(),
        weapon_display: data[7].clone(),
        muzzle: data[8].clone(),
        muzzle_display: data[9].clone(),
        magazine: data[10].clone(),
        magazine_display: data[11].clone(),
        ammo: data[12].clone(),
        fire_mode: data[13].clone(),
        trajectory: parse_trajectory(&data[14])?,
        initial_velocity: data[15].clone(),
        hits: Vec::new(),
        simulation_type: data[17].clone(),
        is_submunition: parse_bool("isSub", &data[18]).unwrap_or(false),
        magazine_icon: data[19].clone(),
    };

    Ok(ParsedProjectile {
        event,
        raw_hits: parse_hit_parts(&data[16]),
    })
}

/// Shared layout of `:KILL:` and `:HIT:`: [frame, victimId, attackerId,
/// weaponArray, distance]. The distance is optional.
fn parse_combat(args: &[String]) -> Result<RawCombatEvent, ParseError> {
    require_fields(args, 4)?;
    // Unescaping doubles as the SQF array's quote delimiter, so read it first.
    let raw_weapon = trim_quotes(&args[3]).to_string();
    let data = clean_args(args);

    let [vehicle, weapon, magazine] = parse_sqf_string_array(&raw_weapon)?;
    let event_text = format_weapon_text(&vehicle, &weapon, &magazine);

    let distance = match data.get(4) {
        Some(d) => parse_f32("distance", d)?,
        None => 0.0,
    };

    Ok(RawCombatEvent {
        capture_frame: parse_frame(&data[0])?,
        victim_id: parse_object_id("victimId", &data[1])?,
        attacker_id: parse_object_id("attackerId", &data[2])?,
        weapon: WeaponDescriptor {
            vehicle,
            weapon,
            magazine,
        },
        event_text,
        distance,
    })
}

/// `:KILL:` [frame, victimId, killerId, weaponArray, distance].
pub fn parse_kill(args: &[String]) -> Result<RawCombatEvent, ParseError> {
    parse_combat(args)
}

/// `:HIT:` [frame, victimId, shooterId, weaponArray, distance].
pub fn parse_hit(args: &[String]) -> Result<RawCombatEvent, ParseError> {
    parse_combat(args)
}

/// `:FIRED:` [ocapId, frame, endPos, startPos, weapon, magazine, firingMode].
pub fn parse_fired(args: &[String]) -> Result<FiredEvent, ParseError> {
    require_fields(args, 7)?;
    let data = clean_args(args);

    Ok(FiredEvent {
        soldier_id: parse_object_id("ocapId", &data[0])?,
        capture_frame: parse_frame(&data[1])?,
        end_position: parse_position(&data[2])?,
        start_position: parse_position(&data[3])?,
        weapon: data[4].clone(),
        magazine: data[5].clone(),
        firing_mode: data[6].clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
