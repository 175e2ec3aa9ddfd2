use mekanix_common::geometry::normalize_angle;
use mekanix_common::{EntityId, Pose};
use mekanix_kernel::{GraphViolation, JointKind, Level, LevelError};

use crate::body::Body;
use crate::config::PhysicsConfig;
use crate::solver::{Constraint, ConstraintKind};
use crate::world::{GoalZone, PhysicsWorld};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("joint {joint} is invalid: {violation}")]
    InvalidLevelGraph {
        joint: EntityId,
        violation: GraphViolation,
    },
    #[error(transparent)]
    InvalidLevel(LevelError),
}

/// Build a simulation from a level: one body per part and platform, one
/// constraint per joint. Nothing is built if the level fails validation.
pub fn compile(level: &Level, config: &PhysicsConfig) -> Result<PhysicsWorld, CompileError> {
    let _span = tracing::info_span!("compile", level_name = level.name()).entered();
    if let Err(err) = level.validate() {
        tracing::warn!(%err, "refusing to compile");
        return Err(match err {
            LevelError::InvalidLevelGraph { joint, violation } => {
                CompileError::InvalidLevelGraph { joint, violation }
            }
            other => CompileError::InvalidLevel(other),
        });
    }

    let goal = level.goal();
    let mut world = PhysicsWorld::new(
        config.clone(),
        GoalZone {
            entity: goal.id,
            center: goal.center,
            radius: goal.radius,
        },
    );

    // merge parts and platforms so bodies land in ascending id order
    let mut shapes: Vec<(EntityId, Body)> = level
        .parts()
        .values()
        .map(|p| {
            let body = Body::dynamic(p.id, p.rect(), config.density, p.material.friction());
            (p.id, body)
        })
        .chain(
            level
                .platforms()
                .values()
                .map(|p| (p.id, Body::fixed(p.id, p.rect(), config.platform_friction))),
        )
        .collect();
    shapes.sort_by_key(|(id, _)| *id);
    for (_, body) in shapes {
        world.push_body(body);
    }

    for joint in level.joints().values() {
        let (Some(body_a), Some(body_b)) = (world.slot(joint.a), world.slot(joint.b)) else {
            // validate() guarantees both endpoints
            continue;
        };
        let kind = match joint.kind {
            JointKind::Pivot => ConstraintKind::Pin,
            JointKind::Contraction {
                rest_length,
                min_rest,
                max_rest,
                ..
            } => ConstraintKind::Muscle {
                rest_length,
                min_rest,
                max_rest,
            },
        };
        world.push_constraint(Constraint {
            joint: joint.id,
            body_a,
            body_b,
            local_a: joint.local_a,
            local_b: joint.local_b,
            kind,
        });
    }
    world.set_primary(level.player().primary);

    tracing::debug!(
        bodies = world.bodies().len(),
        constraints = world.constraints().len(),
        "compiled level"
    );
    Ok(world)
}

/// Copy the simulated part poses into a clone of `level`.
///
/// Ids and the id counter are untouched. Bodies with a non-finite pose keep
/// the level's geometry, and muscles go back to relaxed.
pub fn extract_snapshot(world: &PhysicsWorld, level: &Level) -> Level {
    let mut out = level.clone();
    let ids: Vec<EntityId> = level.parts().keys().copied().collect();
    for id in ids {
        let Some(body) = world.body_for(id) else {
            continue;
        };
        if !body.is_finite() {
            tracing::warn!(%id, "non-finite body pose, keeping edit geometry");
            continue;
        }
        let pose = Pose::new(body.position, normalize_angle(body.angle));
        if let Err(err) = out.set_part_pose(id, pose) {
            tracing::warn!(%id, %err, "could not read back body pose");
        }
    }
    out.relax_joints();
    out.drain_events();
    out.mark_dirty();
    out
}
