use glam::Vec2;
use mekanix_common::{Aabb, EntityId, EntityKind, HandleId, Mode, OrientedRect};
use mekanix_kernel::Level;
use mekanix_physics::{BodyKind, ConstraintKind, PhysicsWorld};

/// Gap between a selected entity and its highlight ring.
const HIGHLIGHT_MARGIN: f32 = 6.0;
/// Ring radius drawn around a selected joint.
const JOINT_RING_RADIUS: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRole {
    Part,
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeItem {
    pub id: EntityId,
    pub role: ShapeRole,
    pub rect: OrientedRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointMarker {
    pub id: EntityId,
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub contraction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalCircle {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    /// Fill fraction in [0, 1]; always 0 in Edit.
    pub progress: f32,
}

/// Selection ring around the selected entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub mode: Mode,
    pub shapes: Vec<ShapeItem>,
    pub joints: Vec<JointMarker>,
    pub goal: GoalCircle,
    /// Gizmo handles of the selection, in world space. Empty in Play.
    pub handles: Vec<(HandleId, Vec2)>,
    pub highlight: Option<Highlight>,
    pub tick: Option<u64>,
    pub input_held: bool,
}

impl Frame {
    /// Describe the level as authored, with the selection's gizmo.
    pub fn edit(level: &Level, selected: Option<EntityId>, handles: Vec<(HandleId, Vec2)>) -> Self {
        let mut shapes: Vec<ShapeItem> = level
            .parts()
            .values()
            .map(|p| ShapeItem {
                id: p.id,
                role: ShapeRole::Part,
                rect: p.rect(),
            })
            .chain(level.platforms().values().map(|p| ShapeItem {
                id: p.id,
                role: ShapeRole::Platform,
                rect: p.rect(),
            }))
            .collect();
        shapes.sort_by_key(|s| s.id);

        let joints = level
            .joints()
            .values()
            .filter_map(|j| {
                let (anchor_a, anchor_b) = level.joint_anchors(j)?;
                Some(JointMarker {
                    id: j.id,
                    anchor_a,
                    anchor_b,
                    contraction: j.kind.is_contraction(),
                })
            })
            .collect();

        let goal = level.goal();
        let highlight = selected.and_then(|id| {
            let (center, radius) = match level.kind_of(id)? {
                EntityKind::Part | EntityKind::Platform => {
                    let rect = level.shape_of(id)?;
                    (rect.center, rect.bounding_radius())
                }
                EntityKind::Joint => (level.joint_position(id)?, JOINT_RING_RADIUS),
                EntityKind::Goal => (goal.center, goal.radius),
            };
            Some(Highlight {
                id,
                center,
                radius: radius + HIGHLIGHT_MARGIN,
            })
        });

        Self {
            mode: Mode::Edit,
            shapes,
            joints,
            goal: GoalCircle {
                id: goal.id,
                center: goal.center,
                radius: goal.radius,
                progress: 0.0,
            },
            handles,
            highlight,
            tick: None,
            input_held: false,
        }
    }

    /// Describe the running simulation. No gizmo is shown in Play.
    pub fn play(world: &PhysicsWorld) -> Self {
        let bodies = world.bodies();
        let mut shapes: Vec<ShapeItem> = bodies
            .iter()
            .map(|b| ShapeItem {
                id: b.entity,
                role: match b.kind {
                    BodyKind::Dynamic => ShapeRole::Part,
                    BodyKind::Static => ShapeRole::Platform,
                },
                rect: b.rect(),
            })
            .collect();
        shapes.sort_by_key(|s| s.id);

        let joints = world
            .constraints()
            .iter()
            .filter_map(|c| {
                let a = bodies.get(c.body_a)?;
                let b = bodies.get(c.body_b)?;
                Some(JointMarker {
                    id: c.joint,
                    anchor_a: a.world_point(c.local_a),
                    anchor_b: b.world_point(c.local_b),
                    contraction: !matches!(c.kind, ConstraintKind::Pin),
                })
            })
            .collect();

        let zone = world.goal();
        Self {
            mode: Mode::Play,
            shapes,
            joints,
            goal: GoalCircle {
                id: zone.entity,
                center: zone.center,
                radius: zone.radius,
                progress: world.goal_progress(),
            },
            handles: Vec::new(),
            highlight: None,
            tick: Some(world.tick()),
            input_held: world.is_input_held(),
        }
    }

    pub fn shape(&self, id: EntityId) -> Option<&ShapeItem> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Bounds of every shape, for camera framing.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_rects(self.shapes.iter().map(|s| &s.rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mekanix_kernel::presets;
    use mekanix_physics::{PhysicsConfig, compile};

    #[test]
    fn edit_frame_lists_every_shape_and_joint() {
        let level = presets::steps();
        let frame = Frame::edit(&level, None, Vec::new());
        assert_eq!(frame.mode, Mode::Edit);
        assert_eq!(frame.shapes.len(), level.parts().len() + level.platforms().len());
        assert_eq!(frame.joints.len(), level.joints().len());
        assert!(frame.shapes.windows(2).all(|w| w[0].id < w[1].id));
        assert!(frame.highlight.is_none());
        assert_eq!(frame.tick, None);
    }

    #[test]
    fn selection_gets_a_ring() {
        let level = presets::default_level();
        let root = level.player().primary;
        let frame = Frame::edit(&level, Some(root), Vec::new());
        let ring = frame.highlight.unwrap();
        assert_eq!(ring.id, root);
        let rect = level.shape_of(root).unwrap();
        assert!(ring.radius > rect.bounding_radius());
    }

    #[test]
    fn play_frame_follows_world() {
        let level = presets::default_level();
        let mut world = compile(&level, &PhysicsConfig::default()).unwrap();
        world.set_input_held(true);
        world.step(1.0 / 60.0);
        let frame = Frame::play(&world);
        assert_eq!(frame.mode, Mode::Play);
        assert_eq!(frame.tick, Some(1));
        assert!(frame.input_held);
        assert!(frame.handles.is_empty());
        assert_eq!(frame.shapes.len(), world.bodies().len());
        let root = level.player().primary;
        let body = world.body_for(root).unwrap();
        assert_eq!(frame.shape(root).unwrap().rect.center, body.position);
        assert!(frame.bounds().is_some());
    }
}
