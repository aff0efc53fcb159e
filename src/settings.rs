use crate::error::{TransportError, TransportResult};
use crate::source::IndependentSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_particles() -> usize {
    1
}

fn default_step_length() -> f64 {
    0.1
}

fn default_max_steps() -> usize {
    100_000
}

fn default_seed() -> u64 {
    1
}

fn default_parallel() -> bool {
    true
}

/// Run controls for a [`crate::model::Model`].
///
/// Every field except `source` has a default, so a minimal JSON settings
/// document only needs `{"source": {"energy": 100.0}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Number of histories to transport
    #[serde(default = "default_particles")]
    pub particles: usize,
    /// Fixed step length in mm
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    /// Step budget per history; a history still alive after this many
    /// steps is abandoned with its energy undeposited
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Base seed. History `i` draws from its own stream derived from
    /// `(seed, i)`, so results do not depend on thread scheduling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Transport histories on the rayon thread pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// End a history as soon as the particle is outside the voxel grid
    /// instead of transporting it through the default material
    #[serde(default)]
    pub kill_on_exit: bool,
    pub source: IndependentSource,
}

impl Settings {
    pub fn new(source: IndependentSource) -> Self {
        Settings {
            particles: default_particles(),
            step_length: default_step_length(),
            max_steps: default_max_steps(),
            seed: default_seed(),
            parallel: default_parallel(),
            kill_on_exit: false,
            source,
        }
    }

    pub fn from_json(json: &str) -> TransportResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TransportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> TransportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.particles == 0 {
            return Err(TransportError::invalid("settings: particles must be at least 1"));
        }
        if !self.step_length.is_finite() || self.step_length <= 0.0 {
            return Err(TransportError::invalid(format!(
                "settings: step_length must be finite and positive, got {}",
                self.step_length
            )));
        }
        if self.max_steps == 0 {
            return Err(TransportError::invalid("settings: max_steps must be at least 1"));
        }
        self.source.validate()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(IndependentSource::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;

    #[test]
    fn test_settings_construction() {
        let settings = Settings::default();
        assert_eq!(settings.particles, 1);
        assert_eq!(settings.step_length, 0.1);
        assert_eq!(settings.max_steps, 100_000);
        assert_eq!(settings.seed, 1);
        assert!(settings.parallel);
        assert!(!settings.kill_on_exit);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_minimal_json() {
        let settings = Settings::from_json(r#"{"source": {"energy": 70.0}}"#).unwrap();
        assert_eq!(settings.source.energy, 70.0);
        assert_eq!(settings.step_length, 0.1);
        assert_eq!(settings.source.kind, ParticleKind::Proton);
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "particles": 250,
            "step_length": 0.05,
            "max_steps": 5000,
            "seed": 42,
            "parallel": false,
            "kill_on_exit": true,
            "source": {
                "space": [5.0, 5.0, 0.0],
                "angle": {"type": "monodirectional", "reference_uvw": [0.0, 0.0, 1.0]},
                "energy": 150.0,
                "kind": "alpha"
            }
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.particles, 250);
        assert_eq!(settings.step_length, 0.05);
        assert_eq!(settings.max_steps, 5000);
        assert_eq!(settings.seed, 42);
        assert!(!settings.parallel);
        assert!(settings.kill_on_exit);
        assert_eq!(settings.source.space, [5.0, 5.0, 0.0]);
        assert_eq!(settings.source.kind, ParticleKind::Alpha);

        let reparsed = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, settings);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(Settings::from_json(r#"{"particles": 0, "source": {"energy": 70.0}}"#).is_err());
        assert!(Settings::from_json(r#"{"step_length": -1.0, "source": {"energy": 70.0}}"#).is_err());
        assert!(Settings::from_json(r#"{"max_steps": 0, "source": {"energy": 70.0}}"#).is_err());
        assert!(Settings::from_json(r#"{"source": {"energy": -5.0}}"#).is_err());
        assert!(matches!(
            Settings::from_json(r#"{"particles": 3}"#),
            Err(TransportError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Settings::from_file("does/not/exist.json"),
            Err(TransportError::Io(_))
        ));
    }
}
