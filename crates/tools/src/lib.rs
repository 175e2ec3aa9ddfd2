//! Developer tooling: read-only inspectors over a level and a running world.
//!
//! # Invariants
//! - Inspectors never mutate what they inspect.

mod inspector;

pub use inspector::{EntityInfo, LevelInspector, LevelSummary, WorldInspector, WorldSummary};
