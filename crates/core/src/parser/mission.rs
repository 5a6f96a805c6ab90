use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::model::{Addon, Mission, PlayableSlots, SideFriendly, World};
use crate::wire::{clean_args, require_fields};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireWorld {
    world_name: String,
    display_name: String,
    world_size: f64,
    latitude: f64,
    longitude: f64,
    author: String,
    #[serde(rename = "workshopID")]
    workshop_id: Value,
}

fn required_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, ParseError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ParseError::InvalidField {
            field,
            reason: format!("expected string, got {other}"),
        }),
        None => Err(ParseError::MissingField(field)),
    }
}

fn required_array<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Vec<Value>, ParseError> {
    match obj.get(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ParseError::InvalidField {
            field,
            reason: format!("expected array, got {other}"),
        }),
        None => Err(ParseError::MissingField(field)),
    }
}

/// Workshop ids arrive as strings or as integral JSON numbers.
fn workshop_id(value: &Value) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(u.to_string());
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= 0.0 => Ok(format!("{f:.0}")),
                _ => Err(ParseError::InvalidField {
                    field: "addons",
                    reason: format!("workshop id {n} is not an integer"),
                }),
            }
        }
        other => Err(ParseError::InvalidField {
            field: "addons",
            reason: format!("workshop id must be a string or number, got {other}"),
        }),
    }
}

fn parse_addons(items: &[Value]) -> Result<Vec<Addon>, ParseError> {
    items
        .iter()
        .map(|item| {
            let pair = item.as_array().ok_or_else(|| ParseError::InvalidField {
                field: "addons",
                reason: format!("entry is not an array: {item}"),
            })?;
            let (Some(name), Some(id)) = (pair.first(), pair.get(1)) else {
                return Err(ParseError::InvalidField {
                    field: "addons",
                    reason: format!("entry needs [name, workshopId]: {item}"),
                });
            };
            let name = name.as_str().ok_or_else(|| ParseError::InvalidField {
                field: "addons",
                reason: format!("addon name must be a string: {name}"),
            })?;
            Ok(Addon {
                name: name.to_string(),
                workshop_id: workshop_id(id)?,
            })
        })
        .collect()
}

fn parse_playable_slots(items: &[Value]) -> Result<PlayableSlots, ParseError> {
    let slot = |i: usize| -> Result<u8, ParseError> {
        items
            .get(i)
            .and_then(Value::as_f64)
            .filter(|f| f.fract() == 0.0 && (0.0..=255.0).contains(f))
            .map(|f| f as u8)
            .ok_or_else(|| ParseError::InvalidField {
                field: "playableSlots",
                reason: format!("slot {i} must be a count 0-255"),
            })
    };
    Ok(PlayableSlots {
        east: slot(0)?,
        west: slot(1)?,
        independent: slot(2)?,
        civilian: slot(3)?,
        logic: slot(4)?,
    })
}

fn parse_side_friendly(items: &[Value]) -> Result<SideFriendly, ParseError> {
    let flag = |i: usize| -> Result<bool, ParseError> {
        items
            .get(i)
            .and_then(Value::as_bool)
            .ok_or_else(|| ParseError::InvalidField {
                field: "sideFriendly",
                reason: format!("entry {i} must be a bool"),
            })
    };
    Ok(SideFriendly {
        east_west: flag(0)?,
        east_independent: flag(1)?,
        west_independent: flag(2)?,
    })
}

/// `:NEW:MISSION:` [worldJSON, missionJSON].
///
/// Returns the mission with empty version tags and the world. Version
/// stamping and cache resets belong to the caller.
pub fn parse_mission(args: &[String]) -> Result<(Mission, World), ParseError> {
    require_fields(args, 2)?;
    let data = clean_args(args);

    let wire_world: WireWorld =
        serde_json::from_str(&data[0]).map_err(|source| ParseError::InvalidJson {
            field: "world",
            source,
        })?;
    let world = World {
        world_name: wire_world.world_name,
        display_name: wire_world.display_name,
        world_size: wire_world.world_size,
        latitude: wire_world.latitude,
        longitude: wire_world.longitude,
        author: wire_world.author,
        workshop_id: match &wire_world.workshop_id {
            Value::Null => String::new(),
            v => workshop_id(v).unwrap_or_default(),
        },
    };

    let obj: Map<String, Value> =
        serde_json::from_str(&data[1]).map_err(|source| ParseError::InvalidJson {
            field: "mission",
            source,
        })?;

    let capture_delay = match obj.get("captureDelay") {
        Some(v) => v.as_f64().ok_or_else(|| ParseError::InvalidField {
            field: "captureDelay",
            reason: format!("expected number, got {v}"),
        })?,
        None => return Err(ParseError::MissingField("captureDelay")),
    };

    let mission = Mission {
        mission_name: required_str(&obj, "missionName")?,
        mission_name_source: required_str(&obj, "missionNameSource")?,
        briefing_name: required_str(&obj, "briefingName")?,
        on_load_name: required_str(&obj, "onLoadName")?,
        author: required_str(&obj, "author")?,
        server_name: required_str(&obj, "serverName")?,
        server_profile: required_str(&obj, "serverProfile")?,
        tag: required_str(&obj, "tag")?,
        start_time: chrono::Utc::now(),
        capture_delay: capture_delay as f32,
        addon_version: String::new(),
        extension_version: String::new(),
        extension_build: String::new(),
        addons: parse_addons(required_array(&obj, "addons")?)?,
        playable_slots: parse_playable_slots(required_array(&obj, "playableSlots")?)?,
        side_friendly: parse_side_friendly(required_array(&obj, "sideFriendly")?)?,
    };

    tracing::debug!(
        mission_name = %mission.mission_name,
        world_name = %world.world_name,
        "Parsed mission data"
    );

    Ok((mission, world))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const WORLD: &str = r#"{"worldName":"Altis","displayName":"Altis","worldSize":30720,"latitude":-40.0,"longitude":30.0}"#;

    fn mission_json(addons: &str) -> String {
        format!(
            r#"{{"missionName":"Test Mission","missionNameSource":"file","briefingName":"Test Briefing",
            "serverName":"Test Server","serverProfile":"TestProfile","onLoadName":"Loading Test",
            "author":"Tester","tag":"TvT","captureDelay":1.0,"addons":{addons},
            "playableSlots":[10,10,5,0,2],"sideFriendly":[false,false,true]}}"#
        )
    }

    fn parse(addons: &str) -> Result<(Mission, World), ParseError> {
        parse_mission(&[WORLD.to_string(), mission_json(addons)])
    }

    #[test]
    fn parses_world_and_mission() {
        let (mission, world) = parse(r#"[["addon1","12345"],["addon2",67890]]"#).unwrap();
        assert_eq!(mission.mission_name, "Test Mission");
        assert_eq!(mission.tag, "TvT");
        assert_eq!(mission.capture_delay, 1.0);
        assert_eq!(world.world_name, "Altis");
        assert_eq!(world.world_size, 30720.0);
        assert_eq!(mission.addons.len(), 2);
        assert_eq!(mission.addons[1].workshop_id, "67890");
        assert_eq!(mission.playable_slots.independent, 5);
        assert!(mission.side_friendly.west_independent);
        assert!(mission.addon_version.is_empty());
        assert!(mission.extension_version.is_empty());
    }

    #[test]
    fn empty_addons() {
        let (mission, _) = parse("[]").unwrap();
        assert!(mission.addons.is_empty());
    }

    #[test]
    fn addon_integral_float_accepted() {
        let (mission, _) = parse(r#"[["ACE3",463939057.0]]"#).unwrap();
        assert_eq!(mission.addons[0].workshop_id, "463939057");
    }

    #[test]
    fn addon_bad_shapes_rejected() {
        assert_matches!(parse(r#"[["x",1.5]]"#), Err(ParseError::InvalidField { field: "addons", .. }));
        assert_matches!(parse(r#"[["x",true]]"#), Err(ParseError::InvalidField { field: "addons", .. }));
        assert_matches!(parse(r#"["x"]"#), Err(ParseError::InvalidField { field: "addons", .. }));
        assert_matches!(parse(r#"[[1,"2"]]"#), Err(ParseError::InvalidField { field: "addons", .. }));
        assert_matches!(parse(r#"[["x"]]"#), Err(ParseError::InvalidField { field: "addons", .. }));
    }

    #[test]
    fn missing_or_mistyped_required_field() {
        let json = mission_json("[]").replace(r#""tag":"TvT","#, "");
        assert_matches!(
            parse_mission(&[WORLD.to_string(), json]),
            Err(ParseError::MissingField("tag"))
        );

        let json = mission_json("[]").replace(r#""author":"Tester""#, r#""author":7"#);
        assert_matches!(
            parse_mission(&[WORLD.to_string(), json]),
            Err(ParseError::InvalidField { field: "author", .. })
        );

        let json = mission_json("[]").replace(r#""captureDelay":1.0"#, r#""captureDelay":"1""#);
        assert_matches!(
            parse_mission(&[WORLD.to_string(), json]),
            Err(ParseError::InvalidField { field: "captureDelay", .. })
        );
    }

    #[test]
    fn malformed_json() {
        assert_matches!(
            parse_mission(&["{".to_string(), mission_json("[]")]),
            Err(ParseError::InvalidJson { field: "world", .. })
        );
        assert_matches!(
            parse_mission(&[WORLD.to_string(), "[]".to_string()]),
            Err(ParseError::InvalidJson { field: "mission", .. })
        );
    }
}
