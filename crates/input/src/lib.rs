//! Input boundary: pointer events already mapped to world space, and the
//! actions a toolbar can issue.
//!
//! # Invariants
//! - Consumers see actions and world-space pointers, never raw device events.
//! - The tool set is closed; every consumer matches it exhaustively.

pub mod action;
pub mod pointer;

pub use action::{Action, Tool};
pub use pointer::{PointerEvent, PointerPhase};
