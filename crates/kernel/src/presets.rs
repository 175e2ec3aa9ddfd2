//! Built-in levels, laid out in the 720x1280 logical playfield.

use glam::Vec2;
use std::f32::consts::PI;

use crate::entity::{DEFAULT_GOAL_RADIUS, DEFAULT_MUSCLE_LENGTH, JointKind, PartDesc};
use crate::level::Level;

pub const PRESET_NAMES: [&str; 5] = ["default", "flat", "gap", "steps", "slope"];

/// Leg splay of the starter walker, radians either side of vertical.
const WALKER_SPLAY: f32 = 0.5;
/// Local pin position on each leg, measured from its center.
const WALKER_PIN: Vec2 = Vec2::new(0.0, -30.0);

pub fn preset(name: &str) -> Option<Level> {
    match name {
        "default" => Some(default_level()),
        "flat" => Some(flat()),
        "gap" => Some(gap()),
        "steps" => Some(steps()),
        "slope" => Some(slope()),
        _ => None,
    }
}

/// Two legs pinned at `pin` in an inverted V, with a muscle between centers.
fn v_walker(name: &str, pin: Vec2, goal: Vec2) -> Level {
    let leg = |angle: f32| {
        let center = pin - Vec2::from_angle(angle).rotate(WALKER_PIN);
        PartDesc::at(center).with_angle(angle)
    };
    let left = leg(-WALKER_SPLAY);
    let right = leg(WALKER_SPLAY);

    let mut level = Level::new(name, goal, DEFAULT_GOAL_RADIUS, left);
    let a = level.player().primary;
    let b = level.add_free_part(right);
    level.insert_joint(a, b, WALKER_PIN, WALKER_PIN, JointKind::Pivot);
    level.insert_joint(
        a,
        b,
        Vec2::ZERO,
        Vec2::ZERO,
        JointKind::contraction(DEFAULT_MUSCLE_LENGTH),
    );
    level
}

pub fn default_level() -> Level {
    let mut level = v_walker("default", Vec2::new(360.0, 1100.0), Vec2::new(500.0, 1000.0));
    level.add_platform_with(Vec2::new(360.0, 1200.0), 720.0, 50.0, 0.0);
    level
}

/// Walled floor with the goal on the far side.
pub fn flat() -> Level {
    let mut level = v_walker("flat", Vec2::new(180.0, 1180.0), Vec2::new(540.0, 1180.0));
    level.add_platform_with(Vec2::new(360.0, 1260.0), 720.0, 40.0, 0.0);
    level.add_platform_with(Vec2::new(0.0, 640.0), 40.0, 1280.0, 0.0);
    level.add_platform_with(Vec2::new(720.0, 640.0), 40.0, 1280.0, 0.0);
    level
}

/// Two floors with a 50-unit gap to cross.
pub fn gap() -> Level {
    let mut level = v_walker("gap", Vec2::new(180.0, 1180.0), Vec2::new(576.0, 1180.0));
    level.add_platform_with(Vec2::new(180.0, 1260.0), 310.0, 40.0, 0.0);
    level.add_platform_with(Vec2::new(540.0, 1260.0), 310.0, 40.0, 0.0);
    level
}

pub fn steps() -> Level {
    let mut level = v_walker("steps", Vec2::new(180.0, 1180.0), Vec2::new(576.0, 1030.0));
    level.add_platform_with(Vec2::new(360.0, 1260.0), 720.0, 40.0, 0.0);
    level.add_platform_with(Vec2::new(360.0, 1180.0), 200.0, 20.0, 0.0);
    level.add_platform_with(Vec2::new(576.0, 1080.0), 200.0, 20.0, 0.0);
    level
}

/// A 15 degree ramp halfway up, goal below its low end.
pub fn slope() -> Level {
    let mut level = v_walker("slope", Vec2::new(180.0, 540.0), Vec2::new(576.0, 690.0));
    level.add_platform_with(Vec2::new(360.0, 1270.0), 720.0, 20.0, 0.0);
    level.add_platform_with(Vec2::new(360.0, 640.0), 600.0, 20.0, PI / 12.0);
    level
}
