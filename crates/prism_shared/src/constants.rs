//! # Engine Constants
//!
//! Names and sizes that the shader and particle crates must agree on.
//! Changing a uniform or attribute name here changes the generated GLSL.

// =============================================================================
// UNIFORMS
// =============================================================================

/// Elapsed-time uniform, advanced by `CompiledShader::update`.
///
/// The particle spawner reads the same uniform to stamp birth times.
pub const TIME_UNIFORM: &str = "u_time";

// =============================================================================
// PARTICLE BUFFERS
// =============================================================================

/// Default logical particle capacity of a spawner.
pub const DEFAULT_MAX_PARTICLES: usize = 1_000;

/// Default extra capacity absorbing a batch that straddles the wrap point.
pub const DEFAULT_SAFETY_SIZE: usize = 100;

/// Floats per instance transform (4x4 matrix).
pub const MATRIX_ITEM_SIZE: usize = 16;
