use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::normalize_angle;

/// Unique identifier for an entity in a level.
///
/// Allocated from a per-level monotonic counter, so ids are never reused and
/// ascending order is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of entity kinds a level can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Part,
    Joint,
    Platform,
    Goal,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Part => "part",
            Self::Joint => "joint",
            Self::Platform => "platform",
            Self::Goal => "goal",
        };
        f.write_str(name)
    }
}

/// Which half of the session is live: authoring or simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Edit,
    Play,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Edit => "edit",
            Self::Play => "play",
        })
    }
}

/// Planar rigid pose: center position and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Radians, normalized to [0, 2π).
    pub angle: f32,
}

impl Pose {
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            angle: normalize_angle(angle),
        }
    }

    /// Map a point from this pose's local frame into world space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(local)
    }

    /// Map a world-space point into this pose's local frame.
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(world - self.position)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.angle.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
        }
    }
}
