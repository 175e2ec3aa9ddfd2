//! Level Model: the authoritative structure of parts, joints, platforms, the
//! goal, and the player robot.
//!
//! # Invariants
//! - All mutations flow through explicit operations on [`Level`].
//! - Ids are allocated monotonically and never reused.
//! - A failed operation leaves the level untouched.
//! - A level read from outside is only used after [`Level::validate`] accepts it.

pub mod entity;
pub mod level;
pub mod presets;

pub use entity::{
    Actuation, Goal, Joint, JointKind, Material, Part, PartDesc, PartEnd, PartKind, Platform,
    Player,
};
pub use level::{GraphViolation, Inconsistency, Level, LevelError, LevelEvent, PropertyEdit, PropertyName};
