//! Error types for the particle system.

use prism_shared::ConfigError;
use thiserror::Error;

/// Errors from building spawners and emitters.
///
/// Spawning itself never fails: overflow is dropped with a warning.
#[derive(Error, Debug)]
pub enum ParticleError {
    /// The requested capacity is unusable.
    #[error("invalid capacity: max_particles={max_particles}, safety_size={safety_size}, mesh capacity={mesh_capacity}")]
    InvalidCapacity {
        /// Requested logical capacity.
        max_particles: usize,
        /// Requested safety margin.
        safety_size: usize,
        /// Instances the mesh can hold.
        mesh_capacity: usize,
    },

    /// Emission rate is negative, NaN, or infinite without a limit.
    #[error("invalid emission rate: {0}")]
    InvalidRate(f32),

    /// Loading configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for particle operations.
pub type ParticleResult<T> = Result<T, ParticleError>;
