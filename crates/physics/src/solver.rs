//! Positional constraint and contact projection.
//!
//! Each correction moves the two anchor points toward satisfying the
//! constraint, weighted by the bodies' generalized inverse masses so heavy or
//! rotationally stiff bodies move less.

use glam::Vec2;
use mekanix_common::EntityId;

use crate::body::Body;
use crate::config::PhysicsConfig;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintKind {
    /// Zero-length pin between the anchors.
    Pin,
    /// Distance held at `rest_length`, which actuation drives between bounds.
    Muscle {
        rest_length: f32,
        min_rest: f32,
        max_rest: f32,
    },
}

/// A compiled joint between two bodies, by index into the world's body list.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub joint: EntityId,
    pub body_a: usize,
    pub body_b: usize,
    pub local_a: Vec2,
    pub local_b: Vec2,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn rest_length(&self) -> f32 {
        match self.kind {
            ConstraintKind::Pin => 0.0,
            ConstraintKind::Muscle { rest_length, .. } => rest_length,
        }
    }

    /// Move the rest length toward its lower bound (held) or upper bound.
    pub(crate) fn actuate(&mut self, held: bool, config: &PhysicsConfig, dt: f32) {
        if let ConstraintKind::Muscle {
            rest_length,
            min_rest,
            max_rest,
        } = &mut self.kind
        {
            *rest_length = if held {
                (*rest_length - config.contract_rate * dt).max(*min_rest)
            } else {
                (*rest_length + config.relax_rate * dt).min(*max_rest)
            };
        }
    }

    fn stiffness(&self, held: bool, config: &PhysicsConfig) -> f32 {
        match self.kind {
            ConstraintKind::Pin => config.pivot_stiffness,
            ConstraintKind::Muscle { .. } if held => config.muscle_stiffness_contracted,
            ConstraintKind::Muscle { .. } => config.muscle_stiffness_relaxed,
        }
    }
}

/// Shift the anchor at `r_a` on `a` along `correction` and the anchor at `r_b`
/// on `b` against it.
fn apply_pair(bodies: &mut [Body], a: usize, b: usize, r_a: Vec2, r_b: Vec2, correction: Vec2) {
    bodies[a].apply_correction(correction, r_a);
    bodies[b].apply_correction(-correction, r_b);
}

/// Project one joint constraint.
pub fn solve_constraint(bodies: &mut [Body], constraint: &Constraint, held: bool, config: &PhysicsConfig) {
    let (a, b) = (constraint.body_a, constraint.body_b);
    if a >= bodies.len() || b >= bodies.len() {
        return;
    }
    let r_a = bodies[a].offset(constraint.local_a);
    let r_b = bodies[b].offset(constraint.local_b);
    let delta = (bodies[b].position + r_b) - (bodies[a].position + r_a);
    let distance = delta.length();
    if distance < EPSILON {
        return;
    }
    let n = delta / distance;
    let error = distance - constraint.rest_length();
    if error.abs() < EPSILON {
        return;
    }
    let w = bodies[a].generalized_inverse_mass(r_a, n) + bodies[b].generalized_inverse_mass(r_b, n);
    if w < EPSILON {
        return;
    }
    let lambda = error * constraint.stiffness(held, config) / w;
    apply_pair(bodies, a, b, r_a, r_b, n * lambda);
}

/// A corner of a dynamic body found inside a static one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body: usize,
    pub obstacle: usize,
    /// Corner in the body's local frame.
    pub local_point: Vec2,
    /// Unit push-out direction, world space.
    pub normal: Vec2,
    pub depth: f32,
}

/// Corners of dynamic bodies penetrating static ones, in body then obstacle
/// order.
pub fn find_contacts(bodies: &[Body]) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for (i, body) in bodies.iter().enumerate().filter(|(_, b)| b.is_dynamic()) {
        let rect = body.rect();
        for (j, obstacle) in bodies.iter().enumerate().filter(|(_, b)| !b.is_dynamic()) {
            let obstacle_rect = obstacle.rect();
            if rect.center.distance(obstacle_rect.center)
                > rect.bounding_radius() + obstacle_rect.bounding_radius()
            {
                continue;
            }
            for corner in mekanix_common::Corner::ALL {
                let local_point = corner.signs() * rect.half_extents;
                let world = body.world_point(local_point);
                let local = obstacle_rect.to_local(world);
                let pen = obstacle_rect.half_extents - local.abs();
                if pen.x <= 0.0 || pen.y <= 0.0 {
                    continue;
                }
                let (local_normal, depth) = if pen.x < pen.y {
                    (Vec2::new(sign(local.x), 0.0), pen.x)
                } else {
                    (Vec2::new(0.0, sign(local.y)), pen.y)
                };
                contacts.push(Contact {
                    body: i,
                    obstacle: j,
                    local_point,
                    normal: Vec2::from_angle(obstacle_rect.angle).rotate(local_normal),
                    depth,
                });
            }
        }
    }
    contacts
}

fn sign(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Push a penetrating corner out along the contact normal, then cancel its
/// sliding this step up to `mu * depth`.
pub fn solve_contact(bodies: &mut [Body], contact: &Contact, config: &PhysicsConfig) {
    let body = &bodies[contact.body];
    let r = body.offset(contact.local_point);
    let world = body.position + r;
    let obstacle_rect = bodies[contact.obstacle].rect();

    // depth may have changed since detection
    let local = obstacle_rect.to_local(world);
    let pen = obstacle_rect.half_extents - local.abs();
    if pen.x <= 0.0 || pen.y <= 0.0 {
        return;
    }
    let local_normal = Vec2::from_angle(-obstacle_rect.angle).rotate(contact.normal);
    let depth = if local_normal.x.abs() > local_normal.y.abs() { pen.x } else { pen.y };

    let w = body.generalized_inverse_mass(r, contact.normal);
    if w < EPSILON {
        return;
    }
    let mu = (body.friction * config.platform_friction).max(0.0).sqrt();
    let body = &mut bodies[contact.body];
    body.apply_correction(contact.normal * (depth / w), r);

    let r = body.offset(contact.local_point);
    let moved = (body.position + r) - body.prev_world_point(contact.local_point);
    let tangential = moved - contact.normal * moved.dot(contact.normal);
    let slide = tangential.length();
    if slide < EPSILON {
        return;
    }
    let t = tangential / slide;
    let w_t = body.generalized_inverse_mass(r, t);
    if w_t < EPSILON {
        return;
    }
    let cancel = slide.min(mu * depth);
    body.apply_correction(-t * (cancel / w_t), r);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mekanix_common::OrientedRect;

    fn part(center: Vec2) -> Body {
        Body::dynamic(EntityId(1), OrientedRect::new(center, 20.0, 100.0, 0.0), 0.01, 1.0)
    }

    fn ground() -> Body {
        Body::fixed(EntityId(9), OrientedRect::new(Vec2::new(0.0, 100.0), 400.0, 40.0, 0.0), 1.0)
    }

    #[test]
    fn pin_pulls_anchors_together() {
        let mut bodies = vec![part(Vec2::ZERO), part(Vec2::new(30.0, 0.0))];
        let pin = Constraint {
            joint: EntityId(3),
            body_a: 0,
            body_b: 1,
            local_a: Vec2::new(0.0, 40.0),
            local_b: Vec2::new(0.0, -40.0),
            kind: ConstraintKind::Pin,
        };
        let config = PhysicsConfig::default();
        let gap = |bodies: &[Body]| {
            bodies[0]
                .world_point(pin.local_a)
                .distance(bodies[1].world_point(pin.local_b))
        };
        let before = gap(&bodies);
        for _ in 0..20 {
            solve_constraint(&mut bodies, &pin, false, &config);
        }
        assert!(gap(&bodies) < before * 0.01);
    }

    #[test]
    fn pin_to_static_body_moves_only_dynamic_side() {
        let mut bodies = vec![part(Vec2::new(0.0, 0.0)), ground()];
        let pin = Constraint {
            joint: EntityId(3),
            body_a: 0,
            body_b: 1,
            local_a: Vec2::new(0.0, 40.0),
            local_b: Vec2::new(0.0, -20.0),
            kind: ConstraintKind::Pin,
        };
        solve_constraint(&mut bodies, &pin, false, &PhysicsConfig::default());
        assert_eq!(bodies[1].position, Vec2::new(0.0, 100.0));
        assert!(bodies[0].position.y > 0.0);
    }

    #[test]
    fn muscle_rest_length_clamps_at_bounds() {
        let config = PhysicsConfig::default();
        let mut muscle = Constraint {
            joint: EntityId(4),
            body_a: 0,
            body_b: 1,
            local_a: Vec2::ZERO,
            local_b: Vec2::ZERO,
            kind: ConstraintKind::Muscle {
                rest_length: 100.0,
                min_rest: 50.0,
                max_rest: 100.0,
            },
        };
        for _ in 0..60 {
            muscle.actuate(true, &config, 1.0 / 60.0);
        }
        assert_eq!(muscle.rest_length(), 50.0);
        for _ in 0..120 {
            muscle.actuate(false, &config, 1.0 / 60.0);
        }
        assert_eq!(muscle.rest_length(), 100.0);
    }

    #[test]
    fn corner_inside_platform_is_pushed_out() {
        // bottom corners sit 10 units into the ground's top face at y = 80
        let mut bodies = vec![part(Vec2::new(0.0, 40.0)), ground()];
        let contacts = find_contacts(&bodies);
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|c| c.normal == Vec2::new(0.0, -1.0)));
        assert!(contacts.iter().all(|c| (c.depth - 10.0).abs() < 1e-4));

        let config = PhysicsConfig::default();
        for _ in 0..10 {
            for contact in &find_contacts(&bodies) {
                solve_contact(&mut bodies, contact, &config);
            }
        }
        let lowest = bodies[0].rect().corners().iter().map(|c| c.y).fold(f32::MIN, f32::max);
        assert!(lowest <= 80.0 + 1e-3);
    }

    #[test]
    fn distant_bodies_have_no_contacts() {
        let bodies = vec![part(Vec2::new(0.0, -500.0)), ground()];
        assert!(find_contacts(&bodies).is_empty());
    }
}
