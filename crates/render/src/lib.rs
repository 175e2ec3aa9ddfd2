//! Rendering adapter: a read-only description of what to draw, and a
//! renderer trait that consumes it.
//!
//! # Invariants
//! - A frame is derived from the level (Edit) or the physics world (Play)
//!   and never feeds back into either.
//! - Shapes are listed in ascending id order, so later shapes draw on top
//!   and match the editor's hit-test order.
//!
//! Only a text renderer ships here; a GPU backend implements the same trait.

mod frame;
mod renderer;

pub use frame::{Frame, GoalCircle, Highlight, JointMarker, ShapeItem, ShapeRole};
pub use renderer::{DebugTextRenderer, Renderer};
