use mekanix_author::EditorConfig;
use mekanix_physics::PhysicsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What the level looks like after returning from Play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPolicy {
    /// The level exactly as it was when Play began.
    #[default]
    RestoreSnapshot,
    /// Part poses as the simulation left them, muscles relaxed.
    KeepSimulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Physics step length in seconds.
    pub fixed_dt: f32,
    /// Cap on physics steps per `advance` call; any further backlog is dropped.
    pub max_steps_per_frame: u32,
    pub return_policy: ReturnPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_steps_per_frame: 8,
            return_policy: ReturnPolicy::default(),
        }
    }
}

/// Every tunable of the core, loadable from YAML. Missing keys keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MekanixConfig {
    pub physics: PhysicsConfig,
    pub editor: EditorConfig,
    pub session: SessionConfig,
}

impl MekanixConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject values the stepper cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.session.fixed_dt;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "session.fixed_dt must be positive, got {dt}"
            )));
        }
        if self.session.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "session.max_steps_per_frame must be at least 1".into(),
            ));
        }
        if self.physics.iterations == 0 {
            return Err(ConfigError::Invalid(
                "physics.iterations must be at least 1".into(),
            ));
        }
        let rates = [self.physics.contract_rate, self.physics.relax_rate];
        if rates.iter().any(|r| !(r.is_finite() && *r >= 0.0)) {
            return Err(ConfigError::Invalid(
                "physics contraction rates must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_roundtrip_through_yaml() {
        let config = MekanixConfig::default();
        let yaml = config.to_yaml().unwrap();
        let back = MekanixConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "session:\n  max_steps_per_frame: 3\n  return_policy: keep_simulated\nphysics:\n  contract_rate: 300.0\n";
        let config = MekanixConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.session.max_steps_per_frame, 3);
        assert_eq!(config.session.return_policy, ReturnPolicy::KeepSimulated);
        assert_eq!(config.session.fixed_dt, 1.0 / 60.0);
        assert_eq!(config.physics.contract_rate, 300.0);
        assert_eq!(config.physics.relax_rate, PhysicsConfig::default().relax_rate);
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(MekanixConfig::from_yaml_str("{}").unwrap(), MekanixConfig::default());
    }

    #[test]
    fn bad_values_rejected() {
        for yaml in [
            "session:\n  fixed_dt: 0.0\n",
            "session:\n  max_steps_per_frame: 0\n",
            "physics:\n  iterations: 0\n",
            "physics:\n  relax_rate: -1.0\n",
        ] {
            assert!(
                matches!(MekanixConfig::from_yaml_str(yaml), Err(ConfigError::Invalid(_))),
                "{yaml}"
            );
        }
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            MekanixConfig::from_yaml_str("session: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mekanix.yaml");
        std::fs::write(&path, "editor:\n  handle_tolerance_px: 20.0\n").unwrap();
        let config = MekanixConfig::load(&path).unwrap();
        assert_eq!(config.editor.handle_tolerance_px, 20.0);
        assert!(matches!(
            MekanixConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
