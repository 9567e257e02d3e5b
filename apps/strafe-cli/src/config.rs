use std::path::Path;

use serde::{Deserialize, Serialize};
use strafe_input::ControlConfig;
use strafe_physics::PhysicsConfig;

/// Everything tunable about a simulation run. Missing sections take their
/// defaults; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub control: ControlConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SimConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.control;
        for (name, value) in [
            ("control.slow_speed", c.slow_speed),
            ("control.fast_speed", c.fast_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !c.look_sensitivity.is_finite() {
            return Err(ConfigError::Invalid(
                "control.look_sensitivity must be finite".into(),
            ));
        }
        Ok(())
    }
}
