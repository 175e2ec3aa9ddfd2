//! Mode state machine: one session owns either an editable level or a running
//! simulation, never both, and moves between them through a verified
//! snapshot.
//!
//! # Invariants
//! - In Edit only the level exists; in Play only the world and the snapshot
//!   of the level it was compiled from.
//! - Every Part and Joint id present before Play is present after returning
//!   to Edit, and no id is introduced by the round trip.
//! - A refused Play transition leaves the session in Edit with the level
//!   untouched.
//! - Physics advances in fixed steps, at most `max_steps_per_frame` per call.

pub mod config;
pub mod session;

pub use config::{ConfigError, MekanixConfig, ReturnPolicy, SessionConfig};
pub use session::{Session, SessionError, SessionEvent};
