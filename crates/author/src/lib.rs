//! Edit-mode authoring: pointer hit testing, selection, and the resize and
//! rotate gizmo.
//!
//! # Invariants
//! - At most one entity is selected, and a selection of a deleted entity is
//!   dropped before the next pointer event is handled.
//! - Handles are tested before bodies, so a handle inside a body wins.
//! - A resize drag keeps the corner opposite the dragged handle fixed in
//!   world space and never shrinks an extent below the minimum.
//! - Every edit goes through [`mekanix_kernel::Level`], so a refused edit
//!   leaves the level untouched.

pub mod gizmo;

pub use gizmo::{
    Drag, DragKind, EditorConfig, GizmoController, GizmoEvent, JOINT_HIT_RADIUS_PX, Phase,
    Selection, SelectionActions, Target,
};
