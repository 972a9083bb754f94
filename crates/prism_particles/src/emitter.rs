//! # Rate Emitter
//!
//! Turns a particles-per-second rate into per-frame spawn counts.
//!
//! Fractions carry over between frames, so 30 particles per second at
//! 60 frames per second spawns one particle every other frame. An infinite
//! rate emits everything the limit allows in the first frame (a burst).

use prism_shared::Transform;

use crate::error::{ParticleError, ParticleResult};
use crate::mesh::InstancedMesh;
use crate::record::ParticleRecord;
use crate::spawner::{SpawnReport, Spawner};

/// Rate-driven emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    rate: f32,
    limit: Option<usize>,
    accumulator: f32,
    emitted: usize,
}

impl Emitter {
    /// Emits `rate` particles per second, optionally `limit` in total.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidRate`] if `rate` is negative or NaN, or
    /// infinite without a limit.
    pub fn new(rate: f32, limit: Option<usize>) -> ParticleResult<Self> {
        if rate.is_nan() || rate < 0.0 || (rate.is_infinite() && limit.is_none()) {
            return Err(ParticleError::InvalidRate(rate));
        }
        Ok(Self {
            rate,
            limit,
            accumulator: 0.0,
            emitted: 0,
        })
    }

    /// Emits `count` particles on the first frame, then nothing.
    #[must_use]
    pub const fn burst(count: usize) -> Self {
        Self {
            rate: f32::INFINITY,
            limit: Some(count),
            accumulator: 0.0,
            emitted: 0,
        }
    }

    /// Particles per second.
    #[must_use]
    pub const fn rate(&self) -> f32 {
        self.rate
    }

    /// Total particle limit.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Particles emitted so far.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }

    /// Whether the limit has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.limit.is_some_and(|limit| self.emitted >= limit)
    }

    /// Starts over, as if nothing had been emitted.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.emitted = 0;
    }

    /// Number of particles due after `dt` seconds, counted as emitted.
    ///
    /// A non-finite `dt` emits nothing and leaves the accumulator alone.
    #[allow(clippy::cast_sign_loss)]
    pub fn due(&mut self, dt: f32) -> usize {
        let remaining = self
            .limit
            .map_or(usize::MAX, |limit| limit.saturating_sub(self.emitted));
        if remaining == 0 {
            return 0;
        }

        let count = if self.rate.is_infinite() {
            remaining
        } else if !dt.is_finite() {
            0
        } else {
            self.accumulator += self.rate * dt.max(0.0);
            let whole = self.accumulator.floor();
            self.accumulator -= whole;
            // rate * dt overflowed: the whole part was emitted, drop the rest.
            if !self.accumulator.is_finite() {
                self.accumulator = 0.0;
            }
            (whole as usize).min(remaining)
        };

        self.emitted = self.emitted.saturating_add(count);
        count
    }

    /// Advances by `dt` and spawns whatever is due.
    pub fn emit<M: InstancedMesh>(
        &mut self,
        dt: f32,
        spawner: &mut Spawner<M>,
        setup: impl FnMut(&mut ParticleRecord, usize),
    ) -> SpawnReport {
        let count = self.due(dt);
        spawner.spawn(count, setup)
    }

    /// Advances by `dt` and spawns whatever is due at `origin`.
    pub fn emit_from<M: InstancedMesh>(
        &mut self,
        dt: f32,
        spawner: &mut Spawner<M>,
        origin: &Transform,
        setup: impl FnMut(&mut ParticleRecord, usize),
    ) -> SpawnReport {
        let count = self.due(dt);
        spawner.spawn_from(count, origin, setup)
    }
}
