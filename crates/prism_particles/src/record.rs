//! # Particle Record
//!
//! The per-particle values a setup callback fills in. One record lives on the
//! stack for one iteration of the spawn loop; nothing is shared between
//! particles.

use prism_shared::{Color, Mat4, Quaternion, Transform, Vec3};

/// Initial state of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    /// Spawn position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quaternion,
    /// Initial velocity, units per second.
    pub velocity: Vec3,
    /// Constant acceleration, units per second squared.
    pub acceleration: Vec3,
    /// Scale at birth and at death.
    pub scale: [Vec3; 2],
    /// Color at birth and at death.
    pub color: [Color; 2],
    /// Alpha at birth and at death.
    pub alpha: [f32; 2],
    /// Seconds between spawn and birth.
    pub delay: f32,
    /// Seconds between spawn and death.
    pub lifetime: f32,
}

impl ParticleRecord {
    /// The state every particle starts from.
    pub const DEFAULT: Self = Self {
        position: Vec3::ZERO,
        rotation: Quaternion::IDENTITY,
        velocity: Vec3::ZERO,
        acceleration: Vec3::ZERO,
        scale: [Vec3::ONE, Vec3::ONE],
        color: [Color::WHITE, Color::WHITE],
        alpha: [1.0, 0.0],
        delay: 0.0,
        lifetime: 1.0,
    };

    /// Default state placed at `origin`: position, orientation and both
    /// scales come from the transform.
    #[must_use]
    pub const fn from_origin(origin: &Transform) -> Self {
        let mut record = Self::DEFAULT;
        record.position = origin.position;
        record.rotation = origin.rotation;
        record.scale = [origin.scale, origin.scale];
        record
    }

    /// Instance transform: position and orientation at unit scale.
    ///
    /// Scale is animated by the material from the scale attributes, so it
    /// stays out of the matrix.
    #[must_use]
    pub fn instance_matrix(&self) -> Mat4 {
        Transform::new(self.position, self.rotation, Vec3::ONE).to_matrix()
    }

    /// Color and alpha at birth (`0`) or death (`1`) as RGBA.
    #[must_use]
    pub const fn rgba(&self, end: usize) -> [f32; 4] {
        let c = self.color[end];
        [c.r, c.g, c.b, self.alpha[end]]
    }
}

impl Default for ParticleRecord {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let record = ParticleRecord::default();
        assert_eq!(record.position, Vec3::ZERO);
        assert_eq!(record.rotation, Quaternion::IDENTITY);
        assert_eq!(record.scale, [Vec3::ONE; 2]);
        assert_eq!(record.alpha, [1.0, 0.0]);
        assert_eq!(record.lifetime, 1.0);
        assert_eq!(record.delay, 0.0);
        assert_eq!(record.rgba(0), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(record.rgba(1), [1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_from_origin() {
        let origin = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quaternion::IDENTITY, Vec3::splat(2.0));
        let record = ParticleRecord::from_origin(&origin);
        assert_eq!(record.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(record.scale, [Vec3::splat(2.0); 2]);
        assert_eq!(record.lifetime, 1.0);
    }

    #[test]
    fn test_instance_matrix_ignores_scale() {
        let mut record = ParticleRecord::default();
        record.position = Vec3::new(5.0, 0.0, 0.0);
        record.scale = [Vec3::splat(3.0); 2];
        let matrix = record.instance_matrix();
        assert_eq!(matrix.translation(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(matrix.transform_point(Vec3::X), Vec3::new(6.0, 0.0, 0.0));
    }
}
