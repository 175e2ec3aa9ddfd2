use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tunables for compiling and stepping a world. Units are logical pixels and
/// seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Acceleration applied to every dynamic body; +y is down.
    pub gravity: Vec2,
    /// Constraint and contact passes per step.
    pub iterations: u32,
    /// Mass per unit area of a part.
    pub density: f32,
    /// Fraction of linear velocity removed per step.
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Rest length lost per second while input is held.
    pub contract_rate: f32,
    /// Rest length regained per second after release.
    pub relax_rate: f32,
    pub pivot_stiffness: f32,
    pub muscle_stiffness_relaxed: f32,
    pub muscle_stiffness_contracted: f32,
    /// Friction coefficient of platforms, combined with a part's material.
    pub platform_friction: f32,
    /// Seconds the primary body must touch the goal before the level is won.
    pub goal_dwell: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 980.0),
            iterations: 10,
            density: 0.01,
            linear_damping: 0.01,
            angular_damping: 0.02,
            contract_rate: 240.0,
            relax_rate: 120.0,
            pivot_stiffness: 1.0,
            muscle_stiffness_relaxed: 0.1,
            muscle_stiffness_contracted: 0.2,
            platform_friction: 1.0,
            goal_dwell: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: PhysicsConfig = serde_json::from_str(r#"{ "iterations": 4 }"#).unwrap();
        assert_eq!(config.iterations, 4);
        assert_eq!(config.gravity, Vec2::new(0.0, 980.0));
        assert_eq!(config.contract_rate, 240.0);
    }

    #[test]
    fn contraction_outpaces_relaxation() {
        let config = PhysicsConfig::default();
        assert!(config.contract_rate > config.relax_rate);
        assert!(config.muscle_stiffness_contracted > config.muscle_stiffness_relaxed);
    }
}
