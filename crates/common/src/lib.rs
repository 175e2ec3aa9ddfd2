//! Shared types for the mekanix core: entity ids, poses, the geometry kernel,
//! and the screen/world view transform.
//!
//! # Invariants
//! - Everything here is a pure value or a pure function of its inputs.

pub mod geometry;
pub mod types;
pub mod view;

pub use geometry::{Aabb, Corner, HandleId, OrientedRect};
pub use types::{EntityId, EntityKind, Mode, Pose};
pub use view::{Camera, View};
