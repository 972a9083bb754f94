//! # Particle Spawner
//!
//! Writes batches of particles into the attribute buffers at a moving
//! playhead.
//!
//! ## Ring with a safety margin
//!
//! ```text
//! [0 ........................ max_particles ...... max_particles + safety)
//!  ^ playhead wraps here once a batch ends at or past max_particles
//! ```
//!
//! A batch always starts below `max_particles` and may run into the safety
//! margin, so a batch straddling the wrap point stays contiguous and uploads
//! as one range. Particles that would run past the margin are dropped with a
//! warning.

use std::convert::Infallible;

use prism_shared::Transform;
use tracing::{trace, warn};

use crate::attributes::ParticleAttributes;
use crate::config::SpawnerConfig;
use crate::error::{ParticleError, ParticleResult};
use crate::mesh::InstancedMesh;
use crate::record::ParticleRecord;

/// Outcome of one spawn call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnReport {
    /// Slot of the first particle written.
    pub start: usize,
    /// Particles written, in slots `start..start + written`.
    pub written: usize,
    /// Particles dropped for lack of space.
    pub discarded: usize,
    /// Whether the playhead went back to 0 after this batch.
    pub wrapped: bool,
}

/// Cumulative spawner statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnerStats {
    /// Spawn calls.
    pub batches: u64,
    /// Particles written.
    pub spawned: u64,
    /// Particles dropped.
    pub discarded: u64,
    /// Times the playhead wrapped.
    pub wraps: u64,
}

/// Spawns particles into an instanced mesh.
pub struct Spawner<M: InstancedMesh> {
    mesh: M,
    max_particles: usize,
    safety_size: usize,
    attributes: Option<ParticleAttributes>,
    playhead: usize,
    stats: SpawnerStats,
}

impl<M: InstancedMesh> Spawner<M> {
    /// Creates a spawner drawing into `mesh`.
    ///
    /// Attribute buffers are allocated on the first spawn.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidCapacity`] if `max_particles` is zero or the
    /// mesh holds fewer than `max_particles + safety_size` instances
    /// (including when that sum overflows).
    pub fn new(mesh: M, max_particles: usize, safety_size: usize) -> ParticleResult<Self> {
        let mesh_capacity = mesh.capacity();
        let fits = max_particles
            .checked_add(safety_size)
            .is_some_and(|required| max_particles > 0 && required <= mesh_capacity);
        if !fits {
            return Err(ParticleError::InvalidCapacity {
                max_particles,
                safety_size,
                mesh_capacity,
            });
        }

        Ok(Self {
            mesh,
            max_particles,
            safety_size,
            attributes: None,
            playhead: 0,
            stats: SpawnerStats::default(),
        })
    }

    /// Creates a spawner from a validated config.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Config`] if the config is invalid, otherwise as
    /// [`new`](Self::new).
    pub fn from_config(mesh: M, config: &SpawnerConfig) -> ParticleResult<Self> {
        config.validate()?;
        Self::new(mesh, config.max_particles, config.safety_size)
    }

    /// Logical capacity.
    #[must_use]
    pub const fn max_particles(&self) -> usize {
        self.max_particles
    }

    /// Safety margin.
    #[must_use]
    pub const fn safety_size(&self) -> usize {
        self.safety_size
    }

    /// Slots per attribute buffer. Never overflows: `new` checked it fits
    /// the mesh.
    #[must_use]
    pub const fn max_instance_count(&self) -> usize {
        self.max_particles.saturating_add(self.safety_size)
    }

    /// Slot the next particle goes to.
    #[must_use]
    pub const fn playhead(&self) -> usize {
        self.playhead
    }

    /// Cumulative statistics.
    #[must_use]
    pub const fn stats(&self) -> &SpawnerStats {
        &self.stats
    }

    /// The mesh.
    #[must_use]
    pub const fn mesh(&self) -> &M {
        &self.mesh
    }

    /// The mesh, writable (e.g. for the renderer's upload bookkeeping).
    pub fn mesh_mut(&mut self) -> &mut M {
        &mut self.mesh
    }

    /// Attribute buffers, once the first spawn allocated them.
    #[must_use]
    pub const fn attributes(&self) -> Option<&ParticleAttributes> {
        self.attributes.as_ref()
    }

    /// Acknowledges an upload of every attribute and the transforms.
    pub fn clear_dirty(&mut self) {
        if let Some(attributes) = &mut self.attributes {
            attributes.clear_dirty();
        }
        self.mesh.clear_matrices_dirty();
    }

    /// Spawns `count` particles from the default state.
    pub fn spawn(
        &mut self,
        count: usize,
        mut setup: impl FnMut(&mut ParticleRecord, usize),
    ) -> SpawnReport {
        let result = self.try_spawn::<Infallible>(count, None, |record, index| {
            setup(record, index);
            Ok(())
        });
        match result {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Spawns `count` particles starting at `origin`.
    pub fn spawn_from(
        &mut self,
        count: usize,
        origin: &Transform,
        mut setup: impl FnMut(&mut ParticleRecord, usize),
    ) -> SpawnReport {
        let result = self.try_spawn::<Infallible>(count, Some(origin), |record, index| {
            setup(record, index);
            Ok(())
        });
        match result {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Spawns `count` particles with a fallible setup.
    ///
    /// Each particle starts from [`ParticleRecord::DEFAULT`], or from
    /// `origin` when given, and is passed to `setup` with its index in the
    /// batch. A setup error stops the batch; particles already written stay
    /// written and are accounted for before the error is returned.
    ///
    /// # Errors
    ///
    /// The first error returned by `setup`, unchanged.
    pub fn try_spawn<E>(
        &mut self,
        count: usize,
        origin: Option<&Transform>,
        mut setup: impl FnMut(&mut ParticleRecord, usize) -> Result<(), E>,
    ) -> Result<SpawnReport, E> {
        let max_instance_count = self.max_instance_count();
        let (max_particles, safety_size) = (self.max_particles, self.safety_size);
        let attributes = self
            .attributes
            .get_or_insert_with(|| ParticleAttributes::new(max_particles, safety_size));

        let start = self.playhead;
        let mut written = 0;
        let mut overflow = false;
        let mut outcome = Ok(());

        for index in 0..count {
            if self.playhead >= max_instance_count {
                overflow = true;
                break;
            }

            let mut record = origin.map_or(ParticleRecord::DEFAULT, ParticleRecord::from_origin);
            if let Err(err) = setup(&mut record, index) {
                outcome = Err(err);
                break;
            }

            self.mesh.set_matrix_at(self.playhead, record.instance_matrix());
            let now = self.mesh.current_time();
            attributes.write(self.playhead, &record, now);

            self.playhead += 1;
            written += 1;
        }

        let discarded = if overflow { count - written } else { 0 };
        if overflow {
            warn!(
                discarded,
                max_instance_count,
                "capacity exceeded, particles discarded; consider a larger safety size"
            );
        }

        attributes.mark_dirty(start, written);
        self.mesh.mark_matrices_dirty(start, written);

        if self.playhead > self.mesh.count() {
            self.mesh.set_count(self.playhead);
        }

        let wrapped = self.playhead >= self.max_particles;
        if wrapped {
            trace!(playhead = self.playhead, "playhead wrapped");
            self.playhead = 0;
        }

        self.stats.batches += 1;
        self.stats.spawned += written as u64;
        self.stats.discarded += discarded as u64;
        self.stats.wraps += u64::from(wrapped);

        outcome.map(|()| SpawnReport {
            start,
            written,
            discarded,
            wrapped,
        })
    }
}

impl<M: InstancedMesh + std::fmt::Debug> std::fmt::Debug for Spawner<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spawner")
            .field("mesh", &self.mesh)
            .field("max_particles", &self.max_particles)
            .field("safety_size", &self.safety_size)
            .field("playhead", &self.playhead)
            .field("initialized", &self.attributes.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::InstanceBuffer;

    fn spawner(max_particles: usize, safety_size: usize) -> Spawner<InstanceBuffer> {
        Spawner::new(
            InstanceBuffer::new(max_particles + safety_size),
            max_particles,
            safety_size,
        )
        .unwrap()
    }

    #[test]
    fn test_lazy_attributes() {
        let mut spawner = spawner(10, 0);
        assert!(spawner.attributes().is_none());
        spawner.spawn(0, |_, _| {});
        assert!(spawner.attributes().is_some());
    }

    #[test]
    fn test_rejects_bad_capacity() {
        assert!(matches!(
            Spawner::new(InstanceBuffer::new(10), 0, 0),
            Err(ParticleError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            Spawner::new(InstanceBuffer::new(10), 10, 1),
            Err(ParticleError::InvalidCapacity { mesh_capacity: 10, .. })
        ));
        assert!(matches!(
            Spawner::new(InstanceBuffer::new(10), 10, usize::MAX),
            Err(ParticleError::InvalidCapacity { safety_size: usize::MAX, .. })
        ));
    }

    #[test]
    fn test_setup_receives_batch_index() {
        let mut spawner = spawner(10, 0);
        let mut seen = Vec::new();
        spawner.spawn(3, |_, index| seen.push(index));
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_report_and_stats() {
        let mut spawner = spawner(4, 1);
        let report = spawner.spawn(3, |_, _| {});
        assert_eq!(
            report,
            SpawnReport {
                start: 0,
                written: 3,
                discarded: 0,
                wrapped: false
            }
        );
        let report = spawner.spawn(3, |_, _| {});
        assert_eq!(report.start, 3);
        assert_eq!(report.written, 2);
        assert_eq!(report.discarded, 1);
        assert!(report.wrapped);

        let stats = spawner.stats();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.spawned, 5);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.wraps, 1);
    }
}
