//! Physics World: a fixed-timestep, position-based rigid body simulation of
//! a compiled level, plus the compiler that builds it and reads poses back.
//!
//! # Invariants
//! - Stepping is pure with respect to its inputs: same world, same held flag,
//!   same `dt` sequence, same result, bit for bit.
//! - Bodies and constraints are visited in compile order on every pass.
//! - The world never references the level it was compiled from.

pub mod body;
pub mod compile;
pub mod config;
pub mod solver;
pub mod world;

pub use body::{Body, BodyKind};
pub use compile::{CompileError, compile, extract_snapshot};
pub use config::PhysicsConfig;
pub use solver::{Constraint, ConstraintKind};
pub use world::{GoalZone, PhysicsEvent, PhysicsWorld};
