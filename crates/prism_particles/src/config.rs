//! Spawner configuration.

use std::path::Path;

use prism_shared::{load_toml, ConfigError, DEFAULT_MAX_PARTICLES, DEFAULT_SAFETY_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::ParticleResult;

/// Capacity of one spawner.
///
/// ```toml
/// max_particles = 5000
/// safety_size = 500
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Particles alive at once before the playhead wraps.
    pub max_particles: usize,
    /// Extra slots absorbing a batch that straddles the wrap point.
    pub safety_size: usize,
}

impl SpawnerConfig {
    /// Config with explicit capacities.
    #[must_use]
    pub const fn new(max_particles: usize, safety_size: usize) -> Self {
        Self {
            max_particles,
            safety_size,
        }
    }

    /// Slots per attribute buffer.
    ///
    /// Saturates; [`validate`](Self::validate) rejects sums that overflow.
    #[must_use]
    pub const fn max_instance_count(&self) -> usize {
        self.max_particles.saturating_add(self.safety_size)
    }

    /// Parses a TOML config.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Config`](crate::ParticleError::Config) on malformed
    /// or invalid input.
    pub fn from_toml_str(source: &str) -> ParticleResult<Self> {
        let config: Self = prism_shared::from_toml_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Config`](crate::ParticleError::Config) if the file
    /// cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> ParticleResult<Self> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the capacities are usable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if `max_particles` is zero or the total
    /// slot count does not fit in `usize`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_particles == 0 {
            return Err(ConfigError::Invalid(
                "max_particles must be at least 1".to_string(),
            ));
        }
        if self.max_particles.checked_add(self.safety_size).is_none() {
            return Err(ConfigError::Invalid(format!(
                "max_particles + safety_size overflows ({} + {})",
                self.max_particles, self.safety_size
            )));
        }
        Ok(())
    }
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARTICLES, DEFAULT_SAFETY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParticleError;

    #[test]
    fn test_defaults() {
        let config = SpawnerConfig::default();
        assert_eq!(config.max_particles, 1_000);
        assert_eq!(config.safety_size, 100);
        assert_eq!(config.max_instance_count(), 1_100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SpawnerConfig::from_toml_str("max_particles = 50").unwrap();
        assert_eq!(config, SpawnerConfig::new(50, 100));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SpawnerConfig::from_toml_str("max_particles = 0").unwrap_err();
        assert!(matches!(err, ParticleError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overflowing_capacity_rejected() {
        let config = SpawnerConfig::new(usize::MAX, 1);
        assert_eq!(config.max_instance_count(), usize::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
