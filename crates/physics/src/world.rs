use glam::Vec2;
use mekanix_common::EntityId;
use mekanix_common::geometry::circle_intersects_rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::body::Body;
use crate::config::PhysicsConfig;
use crate::solver::{self, Constraint};

/// Notifications raised while stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    /// The primary body reached the goal. Raised at most once per world.
    LevelWon { tick: u64 },
}

/// The goal as the simulation sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalZone {
    pub entity: EntityId,
    pub center: Vec2,
    pub radius: f32,
}

/// A compiled, steppable simulation.
///
/// Bodies and constraints keep compile order, which is ascending entity id,
/// and every pass walks them in that order.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: Vec<Body>,
    constraints: Vec<Constraint>,
    index: BTreeMap<EntityId, usize>,
    primary: Option<usize>,
    goal: GoalZone,
    tick: u64,
    input_held: bool,
    goal_contact: f32,
    won: bool,
    events: Vec<PhysicsEvent>,
}

impl PhysicsWorld {
    pub(crate) fn new(config: PhysicsConfig, goal: GoalZone) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            constraints: Vec::new(),
            index: BTreeMap::new(),
            primary: None,
            goal,
            tick: 0,
            input_held: false,
            goal_contact: 0.0,
            won: false,
            events: Vec::new(),
        }
    }

    pub(crate) fn push_body(&mut self, body: Body) -> usize {
        let slot = self.bodies.len();
        self.index.insert(body.entity, slot);
        self.bodies.push(body);
        slot
    }

    pub(crate) fn push_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub(crate) fn set_primary(&mut self, entity: EntityId) {
        self.primary = self.index.get(&entity).copied();
    }

    /// Body slot for an entity.
    pub(crate) fn slot(&self, entity: EntityId) -> Option<usize> {
        self.index.get(&entity).copied()
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body_for(&self, entity: EntityId) -> Option<&Body> {
        self.slot(entity).map(|i| &self.bodies[i])
    }

    #[cfg(test)]
    pub(crate) fn body_mut(&mut self, entity: EntityId) -> Option<&mut Body> {
        let slot = self.slot(entity)?;
        self.bodies.get_mut(slot)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_for(&self, joint: EntityId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.joint == joint)
    }

    pub fn primary(&self) -> Option<&Body> {
        self.primary.map(|i| &self.bodies[i])
    }

    pub fn goal(&self) -> &GoalZone {
        &self.goal
    }

    /// Fraction of the dwell time accumulated so far, in [0, 1].
    pub fn goal_progress(&self) -> f32 {
        if self.won {
            1.0
        } else if self.config.goal_dwell <= 0.0 {
            0.0
        } else {
            (self.goal_contact / self.config.goal_dwell).clamp(0.0, 1.0)
        }
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_input_held(&self) -> bool {
        self.input_held
    }

    /// The single control input: held contracts every muscle, released relaxes.
    pub fn set_input_held(&mut self, held: bool) {
        if self.input_held != held {
            tracing::debug!(held, tick = self.tick, "input changed");
        }
        self.input_held = held;
    }

    pub fn events(&self) -> &[PhysicsEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        self.tick += 1;
        let held = self.input_held;
        let config = &self.config;

        for constraint in &mut self.constraints {
            constraint.actuate(held, config, dt);
        }
        for body in &mut self.bodies {
            body.integrate(config.gravity, config.linear_damping, config.angular_damping, dt);
        }
        for _ in 0..config.iterations {
            for constraint in &self.constraints {
                solver::solve_constraint(&mut self.bodies, constraint, held, config);
            }
            for contact in solver::find_contacts(&self.bodies) {
                solver::solve_contact(&mut self.bodies, &contact, config);
            }
        }
        for body in &mut self.bodies {
            body.update_velocity(dt);
        }

        self.update_goal(dt);
    }

    fn update_goal(&mut self, dt: f32) {
        if self.won {
            return;
        }
        let touching = self
            .primary()
            .filter(|b| b.is_finite())
            .is_some_and(|b| circle_intersects_rect(self.goal.center, self.goal.radius, &b.rect()));
        if touching {
            self.goal_contact += dt;
        } else {
            self.goal_contact = (self.goal_contact - 2.0 * dt).max(0.0);
        }
        if touching && self.goal_contact >= self.config.goal_dwell {
            self.won = true;
            tracing::info!(tick = self.tick, "level won");
            self.events.push(PhysicsEvent::LevelWon { tick: self.tick });
        }
    }

    /// Deterministic FNV-1a hash over tick, held flag, and body state.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &[self.input_held as u8]);
        for body in &self.bodies {
            mix(&mut h, &body.entity.0.to_le_bytes());
            mix(&mut h, &body.position.x.to_le_bytes());
            mix(&mut h, &body.position.y.to_le_bytes());
            mix(&mut h, &body.angle.to_le_bytes());
            mix(&mut h, &body.velocity.x.to_le_bytes());
            mix(&mut h, &body.velocity.y.to_le_bytes());
            mix(&mut h, &body.angular_velocity.to_le_bytes());
        }
        for constraint in &self.constraints {
            mix(&mut h, &constraint.rest_length().to_le_bytes());
        }
        h
    }
}
