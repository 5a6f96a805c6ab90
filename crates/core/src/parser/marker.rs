use crate::error::ParseError;
use crate::model::{Marker, MarkerGeometry, MarkerState, SHAPE_POLYLINE};
use crate::types::Frame;
use crate::wire::{
    clean_args, parse_f32, parse_frame, parse_int, parse_polyline, parse_position, require_fields,
};

/// A marker move before its name is resolved to the backend's marker id.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMarkerMove {
    pub marker_name: String,
    /// `marker_id` is 0 until the worker resolves `marker_name`.
    pub state: MarkerState,
}

/// `:NEW:MARKER:` [markerName, direction, type, text, frame, unused,
/// ownerId, color, size, side, positionOrPolyline, shape, alpha, brush].
///
/// The geometry at index 10 is read as a polyline when the shape at index 11
/// is `POLYLINE`, otherwise as a position.
pub fn parse_marker_create(args: &[String]) -> Result<Marker, ParseError> {
    require_fields(args, 14)?;
    let data = clean_args(args);

    let marker_name = data[0].clone();
    let direction = parse_f32("direction", &data[1])?;
    let capture_frame = parse_frame(&data[4])?;

    let owner_id = match parse_int("ownerId", &data[6]) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(marker = %marker_name, error = %e, "Falling back to system owner");
            -1
        }
    };

    let shape = data[11].clone();
    let geometry = if shape == SHAPE_POLYLINE {
        MarkerGeometry::Polyline(parse_polyline(&data[10])?)
    } else {
        MarkerGeometry::Point(parse_position(&data[10])?)
    };

    let alpha = match parse_f32("alpha", &data[12]) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(marker = %marker_name, error = %e, "Falling back to opaque alpha");
            1.0
        }
    };

    Ok(Marker {
        id: 0,
        marker_name,
        capture_frame,
        direction,
        marker_type: data[2].clone(),
        text: data[3].clone(),
        owner_id,
        color: data[7].clone(),
        size: data[8].clone(),
        side: data[9].clone(),
        shape,
        geometry,
        alpha,
        brush: data[13].clone(),
        end_frame: None,
    })
}

/// `:NEW:MARKER:STATE:` [markerName, frame, position, direction, alpha].
pub fn parse_marker_move(args: &[String]) -> Result<ParsedMarkerMove, ParseError> {
    require_fields(args, 5)?;
    let data = clean_args(args);

    let marker_name = data[0].clone();
    let capture_frame = parse_frame(&data[1])?;
    let position = parse_position(&data[2])?;

    let direction = parse_f32("direction", &data[3]).unwrap_or_else(|e| {
        tracing::warn!(marker = %marker_name, error = %e, "Falling back to zero direction");
        0.0
    });
    let alpha = parse_f32("alpha", &data[4]).unwrap_or_else(|e| {
        tracing::warn!(marker = %marker_name, error = %e, "Falling back to opaque alpha");
        1.0
    });

    Ok(ParsedMarkerMove {
        marker_name,
        state: MarkerState {
            marker_id: 0,
            capture_frame,
            position,
            direction,
            alpha,
        },
    })
}

/// `:DELETE:MARKER:` [markerName, frame].
pub fn parse_marker_delete(args: &[String]) -> Result<(String, Frame), ParseError> {
    require_fields(args, 2)?;
    let data = clean_args(args);
    Ok((data[0].clone(), parse_frame(&data[1])?))
}
