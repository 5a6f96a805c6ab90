use crate::error::ParseError;
use crate::model::{Scores, Soldier, SoldierState, Vehicle, VehicleState};
use crate::wire::{
    clean_args, parse_bool, parse_f32, parse_f64, parse_frame, parse_int, parse_object_id,
    parse_position, parse_u8, require_fields,
};

/// `:NEW:SOLDIER:` [frame, ocapId, unitName, groupId, side, isPlayer,
/// roleDescription, className, displayName, playerUID, squadParams].
pub fn parse_soldier(args: &[String]) -> Result<Soldier, ParseError> {
    require_fields(args, 11)?;
    let data = clean_args(args);

    let squad_params = serde_json::from_str(&data[10]).map_err(|source| ParseError::InvalidJson {
        field: "squadParams",
        source,
    })?;

    Ok(Soldier {
        join_frame: parse_frame(&data[0])?,
        object_id: parse_object_id("ocapId", &data[1])?,
        unit_name: data[2].clone(),
        group_id: data[3].clone(),
        side: data[4].clone(),
        is_player: parse_bool("isPlayer", &data[5])?,
        role_description: data[6].clone(),
        class_name: data[7].clone(),
        display_name: data[8].clone(),
        player_uid: data[9].clone(),
        squad_params,
    })
}

/// `:NEW:VEHICLE:` [frame, ocapId, ocapType, displayName, className, customization].
pub fn parse_vehicle(args: &[String]) -> Result<Vehicle, ParseError> {
    require_fields(args, 6)?;
    let data = clean_args(args);

    Ok(Vehicle {
        join_frame: parse_frame(&data[0])?,
        object_id: parse_object_id("ocapId", &data[1])?,
        ocap_type: data[2].clone(),
        display_name: data[3].clone(),
        class_name: data[4].clone(),
        customization: data[5].clone(),
    })
}

/// Bearings arrive as integers or floats; anything unreadable is 0.
fn lenient_bearing(value: &str) -> u16 {
    parse_f64("bearing", value)
        .ok()
        .filter(|b| b.is_finite() && *b >= 0.0)
        .map(|b| b.round().min(f64::from(u16::MAX)) as u16)
        .unwrap_or(0)
}

fn lenient_bool(value: &str) -> bool {
    parse_bool("flag", value).unwrap_or(false)
}

fn parse_scores(raw: &str) -> Option<Scores> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() < 6 {
        tracing::warn!(expected = 6, got = parts.len(), data = raw, "Unexpected score count");
        return None;
    }
    let score = |s: &str| -> u8 { s.parse::<f64>().map(|v| v.clamp(0.0, 255.0) as u8).unwrap_or(0) };
    Some(Scores {
        infantry_kills: score(parts[0]),
        vehicle_kills: score(parts[1]),
        armor_kills: score(parts[2]),
        air_kills: score(parts[3]),
        deaths: score(parts[4]),
        total_score: score(parts[5]),
    })
}

/// `:NEW:SOLDIER:STATE:` 15 fields, or 17 when the addon also sends
/// groupId and side. With 15 fields both are left empty for the worker to
/// fill from the cached registration.
///
/// Bearing, lifestate, in-vehicle and the medical flags are lenient and
/// default when unreadable. Scores are only read for players.
pub fn parse_soldier_state(args: &[String]) -> Result<SoldierState, ParseError> {
    require_fields(args, 15)?;
    let data = clean_args(args);

    let capture_frame = parse_frame(&data[8])?;
    let soldier_id = parse_object_id("ocapId", &data[0])?;
    let position = parse_position(&data[1])?;
    let is_player = parse_bool("isPlayer", &data[6])?;

    let scores = if is_player {
        parse_scores(&data[11]).unwrap_or_default()
    } else {
        Scores::default()
    };

    let in_vehicle_object_id = parse_int("inVehicleId", &data[13])
        .ok()
        .filter(|id| *id >= 0)
        .and_then(|id| u16::try_from(id).ok());

    let (group_id, side) = if data.len() >= 17 {
        (data[15].clone(), data[16].clone())
    } else {
        (String::new(), String::new())
    };

    Ok(SoldierState {
        soldier_id,
        capture_frame,
        position,
        bearing: lenient_bearing(&data[2]),
        lifestate: parse_u8("lifestate", &data[3]).unwrap_or(0),
        in_vehicle: lenient_bool(&data[4]),
        unit_name: data[5].clone(),
        is_player,
        current_role: data[7].clone(),
        has_stable_vitals: lenient_bool(&data[9]),
        is_dragged_carried: lenient_bool(&data[10]),
        scores,
        vehicle_role: data[12].clone(),
        in_vehicle_object_id,
        stance: data[14].clone(),
        group_id,
        side,
    })
}

/// `:NEW:VEHICLE:STATE:` frame sits at index 5. Crew is kept verbatim.
pub fn parse_vehicle_state(args: &[String]) -> Result<VehicleState, ParseError> {
    require_fields(args, 15)?;
    let data = clean_args(args);

    Ok(VehicleState {
        capture_frame: parse_frame(&data[5])?,
        vehicle_id: parse_object_id("ocapId", &data[0])?,
        position: parse_position(&data[1])?,
        bearing: lenient_bearing(&data[2]),
        is_alive: lenient_bool(&data[3]),
        crew: data[4].clone(),
        fuel: parse_f32("fuel", &data[6])?,
        damage: parse_f32("damage", &data[7])?,
        engine_on: parse_bool("engineOn", &data[8])?,
        locked: parse_bool("locked", &data[9])?,
        side: data[10].clone(),
        vector_dir: data[11].clone(),
        vector_up: data[12].clone(),
        turret_azimuth: parse_f32("turretAzimuth", &data[13])?,
        turret_elevation: parse_f32("turretElevation", &data[14])?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::args;
    use crate::types::Position3D;
    use assert_matches::assert_matches;

    fn soldier_args() -> Vec<String> {
        args(&[
            "0", "42", "Alpha", "G1", "WEST", "true", "", "O_F", "Rifle", "", "\"[]\"",
        ])
    }

    fn soldier_state_args() -> Vec<String> {
        args(&[
            "42",
            "[100,200,10]",
            "90",
            "1",
            "false",
            "Alpha",
            "true",
            "rifle",
            "5",
            "true",
            "false",
            "1,2,3,4,5,100",
            "",
            "-1",
            "STAND",
        ])
    }

    #[test]
    fn soldier_registration() {
        let s = parse_soldier(&soldier_args()).unwrap();
        assert_eq!(s.object_id, 42);
        assert_eq!(s.join_frame, 0);
        assert_eq!(s.group_id, "G1");
        assert_eq!(s.side, "WEST");
        assert!(s.is_player);
        assert_eq!(s.squad_params, serde_json::json!([]));
    }

    #[test]
    fn soldier_rejects_bad_squad_params_and_bool() {
        let mut a = soldier_args();
        a[10] = "{not json".into();
        assert_matches!(parse_soldier(&a), Err(ParseError::InvalidJson { field: "squadParams", .. }));

        let mut a = soldier_args();
        a[5] = "maybe".into();
        assert_matches!(parse_soldier(&a), Err(ParseError::InvalidBool { field: "isPlayer", .. }));
    }

    #[test]
    fn soldier_requires_all_fields() {
        let a = args(&["0", "42"]);
        assert_matches!(
            parse_soldier(&a),
            Err(ParseError::InsufficientFields { got: 2, need: 11 })
        );
    }

    #[test]
    fn soldier_state_v1_leaves_group_and_side_empty() {
        let st = parse_soldier_state(&soldier_state_args()).unwrap();
        assert_eq!(st.soldier_id, 42);
        assert_eq!(st.capture_frame, 5);
        assert_eq!(st.position, Position3D::new(100.0, 200.0, 10.0));
        assert_eq!(st.bearing, 90);
        assert_eq!(st.lifestate, 1);
        assert!(st.has_stable_vitals);
        assert_eq!(st.in_vehicle_object_id, None);
        assert_eq!(st.scores.infantry_kills, 1);
        assert_eq!(st.scores.total_score, 100);
        assert_eq!(st.stance, "STAND");
        assert!(st.group_id.is_empty());
        assert!(st.side.is_empty());
    }

    #[test]
    fn soldier_state_v2_carries_group_and_side() {
        let mut a = soldier_state_args();
        a[13] = "7".into();
        a.push("G2".into());
        a.push("EAST".into());
        let st = parse_soldier_state(&a).unwrap();
        assert_eq!(st.group_id, "G2");
        assert_eq!(st.side, "EAST");
        assert_eq!(st.in_vehicle_object_id, Some(7));
    }

    #[test]
    fn soldier_state_malformed_scores_are_not_fatal() {
        let mut a = soldier_state_args();
        a[11] = "1,2".into();
        let st = parse_soldier_state(&a).unwrap();
        assert_eq!(st.scores, Scores::default());
    }

    #[test]
    fn soldier_state_ignores_scores_for_ai() {
        let mut a = soldier_state_args();
        a[6] = "false".into();
        let st = parse_soldier_state(&a).unwrap();
        assert_eq!(st.scores, Scores::default());
    }

    #[test]
    fn soldier_state_lenient_fields_default() {
        let mut a = soldier_state_args();
        a[2] = "north".into();
        a[3] = "x".into();
        a[9] = "".into();
        let st = parse_soldier_state(&a).unwrap();
        assert_eq!(st.bearing, 0);
        assert_eq!(st.lifestate, 0);
        assert!(!st.has_stable_vitals);
    }

    #[test]
    fn soldier_state_bad_position_is_fatal() {
        let mut a = soldier_state_args();
        a[1] = "[100]".into();
        assert_matches!(parse_soldier_state(&a), Err(ParseError::InvalidPosition(_)));
    }

    fn vehicle_state_args() -> Vec<String> {
        args(&[
            "20",
            "[1,2,3]",
            "180",
            "true",
            "[[42,\"driver\"]]",
            "12",
            "0.8",
            "0.1",
            "true",
            "false",
            "WEST",
            "[0,1,0]",
            "[0,0,1]",
            "15.5",
            "-2",
        ])
    }

    #[test]
    fn vehicle_registration() {
        let v = parse_vehicle(&args(&["3", "20", "car", "Hunter", "B_MRAP_01_F", "{}"])).unwrap();
        assert_eq!(v.object_id, 20);
        assert_eq!(v.join_frame, 3);
        assert_eq!(v.ocap_type, "car");
        assert_eq!(v.customization, "{}");
    }

    #[test]
    fn vehicle_state_frame_at_index_five_and_crew_verbatim() {
        let st = parse_vehicle_state(&vehicle_state_args()).unwrap();
        assert_eq!(st.vehicle_id, 20);
        assert_eq!(st.capture_frame, 12);
        assert_eq!(st.crew, "[[42,\"driver\"]]");
        assert!(st.is_alive);
        assert!(st.engine_on);
        assert!(!st.locked);
        assert_eq!(st.turret_elevation, -2.0);
    }

    #[test]
    fn vehicle_state_strict_fields() {
        let mut a = vehicle_state_args();
        a[6] = "full".into();
        assert_matches!(parse_vehicle_state(&a), Err(ParseError::InvalidNumber { field: "fuel", .. }));

        let mut a = vehicle_state_args();
        a[9] = "open".into();
        assert_matches!(parse_vehicle_state(&a), Err(ParseError::InvalidBool { field: "locked", .. }));
    }
}
