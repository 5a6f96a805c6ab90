use serde::{Deserialize, Serialize};

/// Capture frame assigned by the game per sampled tick.
pub type Frame = u32;

/// Producer-assigned soldier/vehicle id, unique within a mission.
pub type ObjectId = u16;

/// Backend-assigned marker id (1-based, insertion order).
pub type MarkerId = u32;

/// World coordinates; `z` carries altitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane projection.
    pub fn xy(&self) -> Position2D {
        Position2D {
            x: self.x,
            y: self.y,
        }
    }

    /// Horizontal distance, ignoring altitude.
    pub fn distance_2d(&self, other: &Position3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A polyline vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

/// One sampled point of a projectile's flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub position: Position3D,
    pub frame: Frame,
}
