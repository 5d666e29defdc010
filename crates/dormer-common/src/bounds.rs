//! Room bounds used to keep the camera inside the walls.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Camera height above the floor, in meters.
pub const EYE_HEIGHT: f32 = 1.7;

/// Axis-aligned room extents in world units.
///
/// Only the X and Z extents take part in clamping. The vertical extents
/// describe the floor and ceiling of the room model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomBounds {
    /// Left wall
    pub min_x: f32,
    /// Right wall
    pub max_x: f32,
    /// Back wall
    pub min_z: f32,
    /// Front wall
    pub max_z: f32,
    /// Floor
    pub min_y: f32,
    /// Ceiling
    pub max_y: f32,
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self {
            min_x: -1.3,
            max_x: 2.0,
            min_z: -2.0,
            max_z: 2.0,
            min_y: 0.0,
            max_y: 2.0,
        }
    }
}

impl RoomBounds {
    /// Creates bounds from explicit wall positions.
    #[must_use]
    pub const fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
            min_y: 0.0,
            max_y: 2.0,
        }
    }

    /// Clamps a camera position into the room and pins it to eye height.
    #[must_use]
    pub fn clamp_position(&self, position: Vec3) -> Vec3 {
        let mut out = position;

        if out.x < self.min_x {
            out.x = self.min_x;
        } else if out.x > self.max_x {
            out.x = self.max_x;
        }

        if out.z < self.min_z {
            out.z = self.min_z;
        } else if out.z > self.max_z {
            out.z = self.max_z;
        }

        out.y = EYE_HEIGHT;
        out
    }

    /// Returns true if the position lies inside the walls (Y ignored).
    #[must_use]
    pub fn contains_xz(&self, position: Vec3) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.z >= self.min_z
            && position.z <= self.max_z
    }

    /// Checks that every minimum is not above its maximum.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_z <= self.max_z && self.min_y <= self.max_y
    }

    /// Center of the floor rectangle at eye height.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min_x + self.max_x) * 0.5,
            EYE_HEIGHT,
            (self.min_z + self.max_z) * 0.5,
        )
    }
}
