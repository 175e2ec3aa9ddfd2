use glam::Vec2;
use mekanix_common::geometry::{OrientedRect, normalize_angle};
use mekanix_common::{EntityId, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moved by gravity, constraints, and contacts.
    Dynamic,
    /// Infinite mass; never moves.
    Static,
}

/// A rectangular rigid body. The angle is left unwrapped while simulating so
/// derived angular velocity stays continuous.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub entity: EntityId,
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub half_extents: Vec2,
    pub inv_mass: f32,
    pub inv_inertia: f32,
    pub friction: f32,
    pub(crate) prev_position: Vec2,
    pub(crate) prev_angle: f32,
}

impl Body {
    /// A dynamic box of `density` per unit area.
    pub fn dynamic(entity: EntityId, rect: OrientedRect, density: f32, friction: f32) -> Self {
        let size = rect.half_extents * 2.0;
        let mass = (size.x * size.y * density).max(f32::EPSILON);
        let inertia = mass * size.length_squared() / 12.0;
        Self {
            inv_mass: 1.0 / mass,
            inv_inertia: 1.0 / inertia.max(f32::EPSILON),
            ..Self::fixed(entity, rect, friction)
        }
        .with_kind(BodyKind::Dynamic)
    }

    pub fn fixed(entity: EntityId, rect: OrientedRect, friction: f32) -> Self {
        Self {
            entity,
            kind: BodyKind::Static,
            position: rect.center,
            angle: rect.angle,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            half_extents: rect.half_extents,
            inv_mass: 0.0,
            inv_inertia: 0.0,
            friction,
            prev_position: rect.center,
            prev_angle: rect.angle,
        }
    }

    fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn rect(&self) -> OrientedRect {
        OrientedRect {
            center: self.position,
            half_extents: self.half_extents,
            angle: self.angle,
        }
    }

    /// Pose with the angle normalized to [0, 2π).
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, normalize_angle(self.angle))
    }

    /// World-space offset of a local point from the center.
    pub fn offset(&self, local: Vec2) -> Vec2 {
        Vec2::from_angle(self.angle).rotate(local)
    }

    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.position + self.offset(local)
    }

    /// Where a local point was at the start of the current step.
    pub(crate) fn prev_world_point(&self, local: Vec2) -> Vec2 {
        self.prev_position + Vec2::from_angle(self.prev_angle).rotate(local)
    }

    /// Effective inverse mass for a correction along `n` applied at offset `r`.
    pub fn generalized_inverse_mass(&self, r: Vec2, n: Vec2) -> f32 {
        let rn = r.perp_dot(n);
        self.inv_mass + self.inv_inertia * rn * rn
    }

    /// Move the body so the point at offset `r` shifts along `correction`,
    /// split between translation and rotation by the inverse masses.
    pub fn apply_correction(&mut self, correction: Vec2, r: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.position += correction * self.inv_mass;
        self.angle += self.inv_inertia * r.perp_dot(correction);
    }

    pub(crate) fn integrate(&mut self, gravity: Vec2, linear_damping: f32, angular_damping: f32, dt: f32) {
        self.prev_position = self.position;
        self.prev_angle = self.angle;
        if !self.is_dynamic() {
            return;
        }
        self.velocity += gravity * dt;
        self.velocity *= (1.0 - linear_damping).max(0.0);
        self.angular_velocity *= (1.0 - angular_damping).max(0.0);
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
    }

    /// Recover velocities from the solved pose change.
    pub(crate) fn update_velocity(&mut self, dt: f32) {
        if !self.is_dynamic() || dt <= 0.0 {
            return;
        }
        self.velocity = (self.position - self.prev_position) / dt;
        self.angular_velocity = (self.angle - self.prev_angle) / dt;
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.angle.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> Body {
        let rect = OrientedRect::new(Vec2::new(100.0, 100.0), 20.0, 100.0, 0.0);
        Body::dynamic(EntityId(1), rect, 0.01, 1.0)
    }

    #[test]
    fn mass_and_inertia_from_box() {
        let body = strip();
        // m = 20 * 100 * 0.01 = 20; I = 20 * (400 + 10000) / 12
        assert!((1.0 / body.inv_mass - 20.0).abs() < 1e-4);
        assert!((1.0 / body.inv_inertia - 20.0 * 10400.0 / 12.0).abs() < 1e-1);
        assert!(body.is_dynamic());
    }

    #[test]
    fn static_bodies_ignore_corrections_and_gravity() {
        let rect = OrientedRect::new(Vec2::ZERO, 200.0, 40.0, 0.0);
        let mut body = Body::fixed(EntityId(2), rect, 1.0);
        body.apply_correction(Vec2::new(5.0, 5.0), Vec2::new(10.0, 0.0));
        body.integrate(Vec2::new(0.0, 980.0), 0.0, 0.0, 1.0 / 60.0);
        assert_eq!(body.position, Vec2::ZERO);
        assert_eq!(body.angle, 0.0);
    }

    #[test]
    fn off_center_correction_rotates() {
        let mut body = strip();
        body.apply_correction(Vec2::new(1.0, 0.0), Vec2::new(0.0, 40.0));
        assert!(body.angle != 0.0);
        let mut centered = strip();
        centered.apply_correction(Vec2::new(1.0, 0.0), Vec2::ZERO);
        assert_eq!(centered.angle, 0.0);
        assert!(centered.position.x > 100.0);
    }

    #[test]
    fn velocity_is_derived_from_displacement() {
        let mut body = strip();
        body.integrate(Vec2::ZERO, 0.0, 0.0, 0.5);
        body.position += Vec2::new(3.0, 0.0);
        body.update_velocity(0.5);
        assert_eq!(body.velocity, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn pose_normalizes_unwrapped_angle() {
        let mut body = strip();
        body.angle = -0.25;
        assert!(body.pose().angle > 6.0);
    }
}
