//! Seeded randomness for setup callbacks.
//!
//! Spawns are reproducible: the same seed gives the same particles.

use prism_shared::{Quaternion, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random source for particle setup.
#[derive(Debug, Clone)]
pub struct SetupRng {
    rng: ChaCha8Rng,
}

impl SetupRng {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform in `[-amplitude, amplitude)`.
    #[inline]
    pub fn plus_minus(&mut self, amplitude: f32) -> f32 {
        (self.unit() * 2.0 - 1.0) * amplitude
    }

    /// Uniform in `[min, max)`.
    #[inline]
    pub fn between(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.unit()
    }

    /// Uniform in `[0, max)`.
    #[inline]
    pub fn up_to(&mut self, max: f32) -> f32 {
        max * self.unit()
    }

    /// `true` with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Each component uniform in `[-amplitude, amplitude)`.
    pub fn vec3_plus_minus(&mut self, amplitude: f32) -> Vec3 {
        Vec3::new(
            self.plus_minus(amplitude),
            self.plus_minus(amplitude),
            self.plus_minus(amplitude),
        )
    }

    /// Uniformly distributed unit vector.
    pub fn direction(&mut self) -> Vec3 {
        let z = self.plus_minus(1.0);
        let theta = self.up_to(std::f32::consts::TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * theta.cos(), r * theta.sin(), z)
    }

    /// Uniformly distributed orientation.
    pub fn rotation(&mut self) -> Quaternion {
        let (u1, u2, u3) = (self.unit(), self.unit(), self.unit());
        let (a, b) = ((1.0 - u1).sqrt(), u1.sqrt());
        let (t2, t3) = (std::f32::consts::TAU * u2, std::f32::consts::TAU * u3);
        Quaternion::new(a * t2.sin(), a * t2.cos(), b * t3.sin(), b * t3.cos())
    }
}
