//! # PRISM Particles
//!
//! Instanced particles driven by a moving playhead.
//!
//! ## Architecture Rules
//!
//! 1. **Fixed capacity** - buffers hold `max_particles + safety_size` slots,
//!    allocated on the first spawn and never resized
//! 2. **One writer** - only the [`Spawner`] moves the playhead
//! 3. **Degrade, don't fail** - overflow drops particles with a warning
//! 4. **Upload what changed** - every batch marks a dirty range
//!
//! ## Example
//!
//! ```rust,ignore
//! let material = particle_material()?;
//! let mesh = InstanceBuffer::for_material(1_100, &material);
//! let mut spawner = Spawner::new(mesh, 1_000, 100)?;
//! let mut rng = SetupRng::seeded(7);
//!
//! spawner.spawn(50, |p, _| {
//!     p.velocity = rng.vec3_plus_minus(2.0);
//!     p.lifetime = rng.between(1.0, 3.0);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod attributes;
pub mod config;
pub mod emitter;
pub mod error;
pub mod material;
pub mod mesh;
pub mod random;
pub mod record;
pub mod spawner;

pub use attributes::{AttributeKind, InstancedAttribute, ParticleAttributes};
pub use config::SpawnerConfig;
pub use emitter::Emitter;
pub use error::{ParticleError, ParticleResult};
pub use material::{particle_master, particle_material};
pub use mesh::{InstanceBuffer, InstancedMesh};
pub use random::SetupRng;
pub use record::ParticleRecord;
pub use spawner::{SpawnReport, Spawner, SpawnerStats};
