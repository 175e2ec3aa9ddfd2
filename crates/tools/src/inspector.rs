use glam::Vec2;
use mekanix_common::{EntityId, EntityKind};
use mekanix_kernel::{JointKind, Level};
use mekanix_physics::PhysicsWorld;

/// Read-only queries against an authored level.
pub struct LevelInspector;

impl LevelInspector {
    pub fn summary(level: &Level) -> LevelSummary {
        LevelSummary {
            name: level.name().to_owned(),
            parts: level.parts().len(),
            joints: level.joints().len(),
            muscles: level.contraction_joints().count(),
            platforms: level.platforms().len(),
            next_id: level.next_id(),
            pending_events: level.events().len(),
        }
    }

    pub fn inspect_entity(level: &Level, id: EntityId) -> Option<EntityInfo> {
        let kind = level.kind_of(id)?;
        let info = match kind {
            EntityKind::Part | EntityKind::Platform => {
                let rect = level.shape_of(id)?;
                EntityInfo {
                    id,
                    kind,
                    position: rect.center,
                    size: Vec2::new(rect.width(), rect.height()),
                    angle: rect.angle,
                    detail: level
                        .part(id)
                        .map(|p| format!("{:?}, {} joints", p.material, p.joints.len()))
                        .unwrap_or_default(),
                }
            }
            EntityKind::Joint => {
                let joint = level.joint(id)?;
                let detail = match joint.kind {
                    JointKind::Pivot => format!("pivot {} - {}", joint.a, joint.b),
                    JointKind::Contraction {
                        rest_length,
                        min_rest,
                        max_rest,
                        ..
                    } => format!(
                        "muscle {} - {} rest {rest_length:.1} in [{min_rest:.1}, {max_rest:.1}]",
                        joint.a, joint.b
                    ),
                };
                EntityInfo {
                    id,
                    kind,
                    position: level.joint_position(id)?,
                    size: Vec2::ZERO,
                    angle: 0.0,
                    detail,
                }
            }
            EntityKind::Goal => {
                let goal = level.goal();
                EntityInfo {
                    id,
                    kind,
                    position: goal.center,
                    size: Vec2::splat(goal.radius * 2.0),
                    angle: 0.0,
                    detail: format!("radius {:.1}", goal.radius),
                }
            }
        };
        Some(info)
    }

    pub fn list_entities(level: &Level) -> Vec<(EntityId, EntityKind)> {
        level
            .entity_ids()
            .into_iter()
            .filter_map(|id| Some((id, level.kind_of(id)?)))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LevelSummary {
    pub name: String,
    pub parts: usize,
    pub joints: usize,
    pub muscles: usize,
    pub platforms: usize,
    pub next_id: EntityId,
    pub pending_events: usize,
}

impl std::fmt::Display for LevelSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level '{}': parts={} joints={} (muscles={}) platforms={} next_id={} pending_events={}",
            self.name,
            self.parts,
            self.joints,
            self.muscles,
            self.platforms,
            self.next_id,
            self.pending_events
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub size: Vec2,
    pub angle: f32,
    pub detail: String,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} pos=({:.2}, {:.2}) size=({:.2}, {:.2}) angle={:.3}",
            self.kind, self.id, self.position.x, self.position.y, self.size.x, self.size.y, self.angle
        )?;
        if !self.detail.is_empty() {
            write!(f, " [{}]", self.detail)?;
        }
        Ok(())
    }
}

/// Read-only queries against a running simulation.
pub struct WorldInspector;

impl WorldInspector {
    pub fn summary(world: &PhysicsWorld) -> WorldSummary {
        WorldSummary {
            tick: world.tick(),
            bodies: world.bodies().len(),
            dynamic: world.bodies().iter().filter(|b| b.is_dynamic()).count(),
            constraints: world.constraints().len(),
            input_held: world.is_input_held(),
            goal_progress: world.goal_progress(),
            won: world.is_won(),
            state_hash: world.state_hash(),
        }
    }

    /// Pose and velocity of the body compiled from `id`.
    pub fn inspect_body(world: &PhysicsWorld, id: EntityId) -> Option<EntityInfo> {
        let body = world.body_for(id)?;
        let kind = if body.is_dynamic() {
            EntityKind::Part
        } else {
            EntityKind::Platform
        };
        Some(EntityInfo {
            id,
            kind,
            position: body.position,
            size: body.half_extents * 2.0,
            angle: body.angle,
            detail: format!(
                "v=({:.2}, {:.2}) w={:.3}",
                body.velocity.x, body.velocity.y, body.angular_velocity
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub tick: u64,
    pub bodies: usize,
    pub dynamic: usize,
    pub constraints: usize,
    pub input_held: bool,
    pub goal_progress: f32,
    pub won: bool,
    pub state_hash: u64,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: tick={} bodies={} (dynamic={}) constraints={} held={} goal={:.0}% won={} hash={:016x}",
            self.tick,
            self.bodies,
            self.dynamic,
            self.constraints,
            self.input_held,
            self.goal_progress * 100.0,
            self.won,
            self.state_hash
        )
    }
}
