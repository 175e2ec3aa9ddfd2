use glam::Vec2;
use mekanix_common::View;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Mouse or touch input, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Vec2,
    pub phase: PointerPhase,
}

impl PointerEvent {
    pub fn down(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Down,
        }
    }

    pub fn moved(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Move,
        }
    }

    pub fn up(position: Vec2) -> Self {
        Self {
            position,
            phase: PointerPhase::Up,
        }
    }

    /// Map a screen-space event through the view.
    pub fn from_screen(view: &View, screen: Vec2, phase: PointerPhase) -> Self {
        Self {
            position: view.screen_to_world(screen),
            phase,
        }
    }
}
