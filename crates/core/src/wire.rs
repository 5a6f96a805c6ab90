//! Helpers for the raw string arguments the game-side addon sends.
//!
//! Every argument arrives as a string, usually wrapped in a pair of double
//! quotes with inner quotes doubled (SQF string escaping). Numbers may come
//! in integer form (`"32"`) or float form (`"32.00"`) depending on how the
//! addon formatted them. Nothing in here logs; failures come back as
//! [`ParseError`].

use crate::error::ParseError;
use crate::types::{Frame, ObjectId, Position2D, Position3D};

/// Remove every leading and trailing `"`.
pub fn trim_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

/// Collapse SQF-escaped `""` into a single `"`.
pub fn fix_escape_quotes(s: &str) -> String {
    s.replace("\"\"", "\"")
}

/// Apply [`trim_quotes`] then [`fix_escape_quotes`] to every argument.
///
/// This is the first step of almost every parser. Arguments that embed an
/// SQF array of strings must be captured before this runs; see
/// [`parse_sqf_string_array`].
pub fn clean_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|a| fix_escape_quotes(trim_quotes(a)))
        .collect()
}

/// Fail with [`ParseError::InsufficientFields`] when `args` is too short.
pub fn require_fields(args: &[String], need: usize) -> Result<(), ParseError> {
    if args.len() < need {
        return Err(ParseError::InsufficientFields {
            got: args.len(),
            need,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

fn invalid_number(field: &'static str, value: &str) -> ParseError {
    ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    }
}

/// Parse an unsigned integer given in integer or integral-float form.
///
/// `"32"` and `"32.00"` both yield 32; `"-1"`, `"1.5"`, `"NaN"` are errors.
pub fn parse_uint(field: &'static str, value: &str) -> Result<u64, ParseError> {
    let value = value.trim();
    if let Ok(n) = value.parse::<u64>() {
        return Ok(n);
    }
    let f: f64 = value.parse().map_err(|_| invalid_number(field, value))?;
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f > u64::MAX as f64 {
        return Err(invalid_number(field, value));
    }
    Ok(f as u64)
}

/// Signed counterpart of [`parse_uint`].
pub fn parse_int(field: &'static str, value: &str) -> Result<i64, ParseError> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    let f: f64 = value.parse().map_err(|_| invalid_number(field, value))?;
    if !f.is_finite() || f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return Err(invalid_number(field, value));
    }
    Ok(f as i64)
}

pub fn parse_frame(value: &str) -> Result<Frame, ParseError> {
    let n = parse_uint("frame", value)?;
    Frame::try_from(n).map_err(|_| invalid_number("frame", value))
}

pub fn parse_object_id(field: &'static str, value: &str) -> Result<ObjectId, ParseError> {
    let n = parse_uint(field, value)?;
    ObjectId::try_from(n).map_err(|_| invalid_number(field, value))
}

/// Parse an object id where `-1` means "none".
pub fn parse_optional_object_id(
    field: &'static str,
    value: &str,
) -> Result<Option<ObjectId>, ParseError> {
    let n = parse_int(field, value)?;
    if n < 0 {
        return Ok(None);
    }
    ObjectId::try_from(n)
        .map(Some)
        .map_err(|_| invalid_number(field, value))
}

pub fn parse_u8(field: &'static str, value: &str) -> Result<u8, ParseError> {
    let n = parse_uint(field, value)?;
    u8::try_from(n).map_err(|_| invalid_number(field, value))
}

pub fn parse_f64(field: &'static str, value: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_number(field, value))
}

pub fn parse_f32(field: &'static str, value: &str) -> Result<f32, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_number(field, value))
}

/// Accepts the spellings the game emits: `true`/`false` in any case, `1`/`0`, `t`/`f`.
pub fn parse_bool(field: &'static str, value: &str) -> Result<bool, ParseError> {
    match value.trim() {
        "1" | "t" | "T" => Ok(true),
        "0" | "f" | "F" => Ok(false),
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        v => Err(ParseError::InvalidBool {
            field,
            value: v.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Parse `"x,y,z"` or `"[x,y,z]"`. Altitude is optional and defaults to 0.
pub fn parse_position(value: &str) -> Result<Position3D, ParseError> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return Err(ParseError::InvalidPosition(value.to_string()));
    }
    let coord = |s: &str| -> Result<f64, ParseError> {
        s.parse::<f64>()
            .map_err(|_| ParseError::InvalidPosition(value.to_string()))
    };
    let x = coord(parts[0])?;
    let y = coord(parts[1])?;
    let z = match parts.get(2) {
        Some(z) => coord(z)?,
        None => 0.0,
    };
    Ok(Position3D { x, y, z })
}

/// Parse a JSON array of `[x,y]` pairs; at least two vertices are required.
pub fn parse_polyline(value: &str) -> Result<Vec<Position2D>, ParseError> {
    let raw: Vec<Vec<f64>> = serde_json::from_str(value.trim())
        .map_err(|e| ParseError::InvalidPolyline(e.to_string()))?;
    if raw.len() < 2 {
        return Err(ParseError::InvalidPolyline(format!(
            "need at least 2 points, got {}",
            raw.len()
        )));
    }
    raw.into_iter()
        .enumerate()
        .map(|(i, pt)| match pt.as_slice() {
            [x, y, ..] => Ok(Position2D { x: *x, y: *y }),
            _ => Err(ParseError::InvalidPolyline(format!(
                "point {i} has {} values",
                pt.len()
            ))),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SQF string arrays
// ---------------------------------------------------------------------------

/// Parse an SQF array of three strings such as `["veh","wpn","mag"]`.
///
/// The input must be the argument with only its outer quotes trimmed: the
/// doubled-quote form `[""veh"",""wpn"",""mag""]` is accepted, and so is an
/// element written as `""` meaning "empty". Missing trailing elements come
/// back as empty strings.
pub fn parse_sqf_string_array(value: &str) -> Result<[String; 3], ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Default::default());
    }
    if !(value.starts_with('[') && value.ends_with(']')) {
        return Err(ParseError::InvalidField {
            field: "weapon",
            reason: format!("not an array: {value:?}"),
        });
    }

    let items: Vec<String> = match serde_json::from_str::<Vec<String>>(value) {
        Ok(items) => items,
        Err(_) => match serde_json::from_str::<Vec<String>>(&fix_escape_quotes(value)) {
            Ok(items) => items,
            Err(_) => value[1..value.len() - 1]
                .split(',')
                .map(|s| s.trim().trim_matches('"').to_string())
                .collect(),
        },
    };

    let mut out: [String; 3] = Default::default();
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item;
    }
    Ok(out)
}

/// Human-readable weapon text for hit/kill events.
///
/// ```
/// use ocap_core::wire::format_weapon_text;
/// assert_eq!(format_weapon_text("", "MX 6.5 mm", "30Rnd Mag"), "MX 6.5 mm [30Rnd Mag]");
/// ```
pub fn format_weapon_text(vehicle: &str, weapon: &str, magazine: &str) -> String {
    let mut text = String::new();
    if !vehicle.is_empty() {
        text.push_str(vehicle);
        if !weapon.is_empty() || !magazine.is_empty() {
            text.push_str(": ");
        }
    }
    text.push_str(weapon);
    if !magazine.is_empty() {
        if !weapon.is_empty() {
            text.push(' ');
        }
        text.push('[');
        text.push_str(magazine);
        text.push(']');
    }
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn trims_and_unescapes() {
        assert_eq!(trim_quotes("\"\"abc\"\""), "abc");
        assert_eq!(fix_escape_quotes("say \"\"hi\"\""), "say \"hi\"");
        let args = vec!["\"[\"\"a\"\"]\"".to_string()];
        assert_eq!(clean_args(&args), vec!["[\"a\"]".to_string()]);
    }

    #[test]
    fn uint_accepts_integer_and_integral_float() {
        assert_eq!(parse_uint("n", "32").unwrap(), 32);
        assert_eq!(parse_uint("n", "32.00").unwrap(), 32);
        assert_eq!(parse_uint("n", " 7 ").unwrap(), 7);
    }

    #[test]
    fn uint_rejects_negative_fractional_and_garbage() {
        assert_matches!(parse_uint("n", "-1"), Err(ParseError::InvalidNumber { field: "n", .. }));
        assert_matches!(parse_uint("n", "1.5"), Err(ParseError::InvalidNumber { .. }));
        assert_matches!(parse_uint("n", "abc"), Err(ParseError::InvalidNumber { .. }));
        assert_matches!(parse_uint("n", ""), Err(ParseError::InvalidNumber { .. }));
        assert_matches!(parse_uint("n", "NaN"), Err(ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn int_accepts_negative_float_form() {
        assert_eq!(parse_int("n", "-1").unwrap(), -1);
        assert_eq!(parse_int("n", "-3.0").unwrap(), -3);
        assert_matches!(parse_int("n", "-3.5"), Err(ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn object_id_range_checked() {
        assert_eq!(parse_object_id("id", "65535").unwrap(), u16::MAX);
        assert_matches!(parse_object_id("id", "65536"), Err(ParseError::InvalidNumber { .. }));
        assert_eq!(parse_optional_object_id("id", "-1").unwrap(), None);
        assert_eq!(parse_optional_object_id("id", "12").unwrap(), Some(12));
    }

    #[test]
    fn bool_spellings() {
        assert!(parse_bool("b", "true").unwrap());
        assert!(parse_bool("b", "True").unwrap());
        assert!(!parse_bool("b", "0").unwrap());
        assert_matches!(parse_bool("b", "yes"), Err(ParseError::InvalidBool { .. }));
    }

    #[test]
    fn position_with_and_without_brackets() {
        let p = parse_position("[100,200,10]").unwrap();
        assert_eq!(p, Position3D::new(100.0, 200.0, 10.0));
        let p = parse_position("1.5, 2.5").unwrap();
        assert_eq!(p, Position3D::new(1.5, 2.5, 0.0));
    }

    #[test]
    fn position_round_trips_through_formatting() {
        let p = parse_position("[6543.21,1234.5,-3.25]").unwrap();
        let again = parse_position(&format!("[{},{},{}]", p.x, p.y, p.z)).unwrap();
        assert!((p.x - again.x).abs() < 1e-9);
        assert!((p.y - again.y).abs() < 1e-9);
        assert!((p.z - again.z).abs() < 1e-9);
    }

    #[test]
    fn position_errors() {
        assert_matches!(parse_position("[5]"), Err(ParseError::InvalidPosition(_)));
        assert_matches!(parse_position("a,b,c"), Err(ParseError::InvalidPosition(_)));
    }

    #[test]
    fn polyline_parses_pairs() {
        let line = parse_polyline("[[1,2],[3,4],[5,6]]").unwrap();
        assert_eq!(line.len(), 3);
        assert_eq!(line[2], Position2D { x: 5.0, y: 6.0 });
    }

    #[test]
    fn polyline_rejects_short_or_malformed() {
        assert_matches!(parse_polyline("[[1,2]]"), Err(ParseError::InvalidPolyline(_)));
        assert_matches!(parse_polyline("[[1,2],[3]]"), Err(ParseError::InvalidPolyline(_)));
        assert_matches!(parse_polyline("nope"), Err(ParseError::InvalidPolyline(_)));
    }

    #[test]
    fn sqf_array_plain_and_doubled() {
        let plain = parse_sqf_string_array(r#"["Hunter","HMG","200Rnd"]"#).unwrap();
        assert_eq!(plain, ["Hunter".to_string(), "HMG".to_string(), "200Rnd".to_string()]);

        let doubled = parse_sqf_string_array(r#"["""",""MX 6.5 mm"",""30Rnd""]"#).unwrap();
        assert_eq!(doubled, [String::new(), "MX 6.5 mm".to_string(), "30Rnd".to_string()]);
    }

    #[test]
    fn sqf_array_tolerates_empties_and_short_lists() {
        let empty = parse_sqf_string_array(r#"["","",""]"#).unwrap();
        assert!(empty.iter().all(String::is_empty));
        let short = parse_sqf_string_array(r#"["","M6 SLAM Mine"]"#).unwrap();
        assert_eq!(short[1], "M6 SLAM Mine");
        assert_eq!(short[2], "");
        assert_matches!(parse_sqf_string_array("MX"), Err(ParseError::InvalidField { .. }));
    }

    #[test]
    fn weapon_text_variants() {
        assert_eq!(
            format_weapon_text("Hunter HMG", "Mk30 HMG .50", ".50 BMG 200Rnd"),
            "Hunter HMG: Mk30 HMG .50 [.50 BMG 200Rnd]"
        );
        assert_eq!(
            format_weapon_text("", "MX 6.5 mm", "6.5 mm 30Rnd Sand Mag"),
            "MX 6.5 mm [6.5 mm 30Rnd Sand Mag]"
        );
        assert_eq!(format_weapon_text("", "M6 SLAM Mine", ""), "M6 SLAM Mine");
        assert_eq!(format_weapon_text("", "", ""), "");
    }
}
