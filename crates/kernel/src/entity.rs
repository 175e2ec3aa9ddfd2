use glam::Vec2;
use mekanix_common::geometry::{OrientedRect, normalize_angle, point_in_circle};
use mekanix_common::{EntityId, Pose};
use serde::{Deserialize, Serialize};

/// Smallest width or height a part or platform may have. Edits below this
/// are clamped, not rejected.
pub const MIN_EXTENT: f32 = 20.0;
pub const MIN_GOAL_RADIUS: f32 = 10.0;
pub const DEFAULT_PART_SIZE: Vec2 = Vec2::new(20.0, 100.0);
pub const DEFAULT_PLATFORM_SIZE: Vec2 = Vec2::new(200.0, 40.0);
pub const DEFAULT_GOAL_RADIUS: f32 = 40.0;
/// Distance of a part's pivot hole from its end.
pub const PIVOT_INSET: f32 = 10.0;
/// Relaxed length given to a freshly added muscle when the parts sit closer.
pub const DEFAULT_MUSCLE_LENGTH: f32 = 100.0;
/// Contracted rest length as a fraction of the relaxed one.
pub const CONTRACTED_RATIO: f32 = 0.5;

/// Surface material of a part; only friction differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Rubber,
    Steel,
    Ice,
}

impl Material {
    pub fn friction(self) -> f32 {
        match self {
            Self::Rubber => 1.0,
            Self::Steel => 0.5,
            Self::Ice => 0.05,
        }
    }
}

/// Which end of a part, in its local frame: head is -y, tail is +y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartEnd {
    Head,
    Tail,
}

impl PartEnd {
    fn sign(self) -> f32 {
        match self {
            Self::Head => -1.0,
            Self::Tail => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Head => Self::Tail,
            Self::Tail => Self::Head,
        }
    }
}

/// How a newly added part is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartKind {
    /// Pinned with a pivot only; swings freely.
    Strut,
    /// Pinned with a pivot and driven by a contraction joint between centers.
    #[default]
    Limb,
}

/// A rigid rectangular robot segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: EntityId,
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub material: Material,
    /// Incident joints in attachment order.
    pub joints: Vec<EntityId>,
}

impl Part {
    pub fn rect(&self) -> OrientedRect {
        OrientedRect::new(self.center, self.width, self.height, self.angle)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.center, self.angle)
    }

    /// Local position of the pivot hole at the given end.
    pub fn local_end(&self, end: PartEnd) -> Vec2 {
        Vec2::new(0.0, end.sign() * (self.height * 0.5 - PIVOT_INSET))
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Construction parameters for a part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartDesc {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub material: Material,
}

impl PartDesc {
    pub fn at(center: Vec2) -> Self {
        Self {
            center,
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub(crate) fn build(self, id: EntityId) -> Part {
        Part {
            id,
            center: self.center,
            width: self.width.max(MIN_EXTENT),
            height: self.height.max(MIN_EXTENT),
            angle: normalize_angle(self.angle),
            material: self.material,
            joints: Vec::new(),
        }
    }
}

impl Default for PartDesc {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            width: DEFAULT_PART_SIZE.x,
            height: DEFAULT_PART_SIZE.y,
            angle: 0.0,
            material: Material::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Actuation {
    #[default]
    Relaxed,
    Contracted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JointKind {
    /// Rigid pin: both anchors held together.
    Pivot,
    /// Distance joint whose rest length is driven between its bounds by input.
    Contraction {
        rest_length: f32,
        min_rest: f32,
        max_rest: f32,
        actuation: Actuation,
    },
}

impl JointKind {
    /// A relaxed contraction joint spanning `max_rest`.
    pub fn contraction(max_rest: f32) -> Self {
        let max_rest = max_rest.max(f32::EPSILON);
        Self::Contraction {
            rest_length: max_rest,
            min_rest: max_rest * CONTRACTED_RATIO,
            max_rest,
            actuation: Actuation::Relaxed,
        }
    }

    pub fn is_contraction(&self) -> bool {
        matches!(self, Self::Contraction { .. })
    }

    pub fn rest_length(&self) -> f32 {
        match self {
            Self::Pivot => 0.0,
            Self::Contraction { rest_length, .. } => *rest_length,
        }
    }

    /// Same joint with actuation reset to its relaxed bound.
    pub fn relaxed(self) -> Self {
        match self {
            Self::Pivot => Self::Pivot,
            Self::Contraction {
                min_rest, max_rest, ..
            } => Self::Contraction {
                rest_length: max_rest,
                min_rest,
                max_rest,
                actuation: Actuation::Relaxed,
            },
        }
    }
}

/// A connector from part `a` to `b`, where `b` is a part or a platform
/// (a platform endpoint pins `a` to the world).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub id: EntityId,
    pub a: EntityId,
    pub b: EntityId,
    /// Anchor in `a`'s local frame.
    pub local_a: Vec2,
    /// Anchor in `b`'s local frame.
    pub local_b: Vec2,
    pub kind: JointKind,
}

impl Joint {
    pub fn endpoints(&self) -> [EntityId; 2] {
        [self.a, self.b]
    }

    pub fn touches(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }

    /// The endpoint opposite `id`, if `id` is an endpoint.
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A static rigid obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: EntityId,
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl Platform {
    pub fn rect(&self) -> OrientedRect {
        OrientedRect::new(self.center, self.width, self.height, self.angle)
    }
}

/// The win zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
}

impl Goal {
    pub fn contains(&self, point: Vec2) -> bool {
        point_in_circle(point, self.center, self.radius)
    }
}

/// The controllable robot. Every part of a level belongs to it; `primary`
/// is the body checked against the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub primary: EntityId,
}
