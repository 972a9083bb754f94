//! # Particle Attribute Buffers
//!
//! One flat `f32` array per per-particle attribute, sized
//! `max_particles + safety_size` items at creation and never resized.
//!
//! ## Layout
//!
//! | attribute      | items | contents                         |
//! |----------------|-------|----------------------------------|
//! | `time`         | 2     | birth time, death time           |
//! | `velocity`     | 3     | initial velocity                 |
//! | `acceleration` | 3     | constant acceleration            |
//! | `color0`       | 4     | rgb + alpha at birth             |
//! | `color1`       | 4     | rgb + alpha at death             |
//! | `scale0`       | 3     | scale at birth                   |
//! | `scale1`       | 3     | scale at death                   |
//!
//! Each attribute tracks the slots written since the last upload as a
//! [`DirtyRange`], so the renderer uploads only what changed.

use prism_core::DirtyRange;
use prism_shader::ValueType;
use tracing::debug;

use crate::record::ParticleRecord;

/// The per-particle attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Birth and death time.
    Time,
    /// Initial velocity.
    Velocity,
    /// Constant acceleration.
    Acceleration,
    /// Color and alpha at birth.
    Color0,
    /// Color and alpha at death.
    Color1,
    /// Scale at birth.
    Scale0,
    /// Scale at death.
    Scale1,
}

impl AttributeKind {
    /// Every attribute, in buffer order.
    pub const ALL: [Self; 7] = [
        Self::Time,
        Self::Velocity,
        Self::Acceleration,
        Self::Color0,
        Self::Color1,
        Self::Scale0,
        Self::Scale1,
    ];

    /// Attribute name in the vertex shader.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Velocity => "velocity",
            Self::Acceleration => "acceleration",
            Self::Color0 => "color0",
            Self::Color1 => "color1",
            Self::Scale0 => "scale0",
            Self::Scale1 => "scale1",
        }
    }

    /// Floats per particle.
    #[must_use]
    pub const fn item_size(self) -> usize {
        self.value_type().components()
    }

    /// Type in the vertex shader.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            Self::Time => ValueType::Vec2,
            Self::Velocity | Self::Acceleration | Self::Scale0 | Self::Scale1 => ValueType::Vec3,
            Self::Color0 | Self::Color1 => ValueType::Vec4,
        }
    }

    /// Vertex shader declarations of every attribute.
    #[must_use]
    pub fn glsl_declarations() -> String {
        Self::ALL
            .iter()
            .map(|kind| format!("attribute {} {};\n", kind.value_type().glsl_name(), kind.name()))
            .collect()
    }
}

/// One fixed-size attribute array.
#[derive(Debug, Clone)]
pub struct InstancedAttribute {
    kind: AttributeKind,
    data: Box<[f32]>,
    dirty: DirtyRange,
}

impl InstancedAttribute {
    /// Zero-filled array of `capacity` items.
    #[must_use]
    pub fn new(kind: AttributeKind, capacity: usize) -> Self {
        Self {
            kind,
            data: vec![0.0; capacity * kind.item_size()].into_boxed_slice(),
            dirty: DirtyRange::new(),
        }
    }

    /// Which attribute this is.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Floats per item.
    #[inline]
    #[must_use]
    pub const fn item_size(&self) -> usize {
        self.kind.item_size()
    }

    /// Number of items.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len() / self.item_size()
    }

    /// The item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[f32]> {
        let size = self.item_size();
        self.data.get(index * size..(index + 1) * size)
    }

    /// Overwrites the item at `index` with the leading floats of `values`.
    ///
    /// Out-of-range indices are ignored; the spawner never produces them.
    #[inline]
    pub fn set_at(&mut self, index: usize, values: &[f32]) {
        let size = self.item_size();
        debug_assert!(values.len() >= size, "{} needs {size} floats", self.kind.name());
        if let Some(slot) = self.data.get_mut(index * size..(index + 1) * size) {
            for (dst, src) in slot.iter_mut().zip(values) {
                *dst = *src;
            }
        }
    }

    /// Writes a 2-component item.
    #[inline]
    pub fn set_xy(&mut self, index: usize, x: f32, y: f32) {
        self.set_at(index, &[x, y]);
    }

    /// Writes a 3-component item.
    #[inline]
    pub fn set_xyz(&mut self, index: usize, x: f32, y: f32, z: f32) {
        self.set_at(index, &[x, y, z]);
    }

    /// Writes a 4-component item.
    #[inline]
    pub fn set_xyzw(&mut self, index: usize, x: f32, y: f32, z: f32, w: f32) {
        self.set_at(index, &[x, y, z, w]);
    }

    /// All floats.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// All floats as bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Items written since the last upload.
    #[must_use]
    pub const fn dirty(&self) -> DirtyRange {
        self.dirty
    }

    /// Dirty window in floats: `(offset, count)`.
    #[must_use]
    pub const fn update_range(&self) -> (usize, usize) {
        self.dirty.scaled(self.item_size())
    }

    /// Whether anything awaits upload.
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Marks `count` items from `offset` for upload.
    pub fn mark_dirty(&mut self, offset: usize, count: usize) {
        self.dirty.mark(offset, count);
    }

    /// Acknowledges an upload.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

/// The full attribute set of one spawner.
#[derive(Debug, Clone)]
pub struct ParticleAttributes {
    max_particles: usize,
    safety_size: usize,
    attributes: [InstancedAttribute; 7],
}

impl ParticleAttributes {
    /// Allocates every attribute with `max_particles + safety_size` items.
    #[must_use]
    pub fn new(max_particles: usize, safety_size: usize) -> Self {
        let capacity = max_particles.saturating_add(safety_size);
        let attributes = AttributeKind::ALL.map(|kind| InstancedAttribute::new(kind, capacity));
        debug!(
            max_particles,
            safety_size,
            bytes = attributes.iter().map(|a| a.as_bytes().len()).sum::<usize>(),
            "allocated particle attributes"
        );
        Self {
            max_particles,
            safety_size,
            attributes,
        }
    }

    /// Items per attribute.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_particles.saturating_add(self.safety_size)
    }

    /// Logical particle capacity.
    #[must_use]
    pub const fn max_particles(&self) -> usize {
        self.max_particles
    }

    /// One attribute.
    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> &InstancedAttribute {
        &self.attributes[kind as usize]
    }

    /// One attribute, writable.
    pub fn get_mut(&mut self, kind: AttributeKind) -> &mut InstancedAttribute {
        &mut self.attributes[kind as usize]
    }

    /// All attributes in buffer order.
    pub fn iter(&self) -> impl Iterator<Item = &InstancedAttribute> {
        self.attributes.iter()
    }

    /// Encodes one particle into slot `index`.
    ///
    /// The time window is `(now + delay, now + lifetime)`.
    pub fn write(&mut self, index: usize, record: &ParticleRecord, now: f32) {
        self.get_mut(AttributeKind::Time)
            .set_xy(index, now + record.delay, now + record.lifetime);
        self.get_mut(AttributeKind::Velocity)
            .set_at(index, &record.velocity.to_array());
        self.get_mut(AttributeKind::Acceleration)
            .set_at(index, &record.acceleration.to_array());
        self.get_mut(AttributeKind::Color0).set_at(index, &record.rgba(0));
        self.get_mut(AttributeKind::Color1).set_at(index, &record.rgba(1));
        self.get_mut(AttributeKind::Scale0)
            .set_at(index, &record.scale[0].to_array());
        self.get_mut(AttributeKind::Scale1)
            .set_at(index, &record.scale[1].to_array());
    }

    /// Marks `count` slots from `offset` dirty on every attribute.
    pub fn mark_dirty(&mut self, offset: usize, count: usize) {
        for attribute in &mut self.attributes {
            attribute.mark_dirty(offset, count);
        }
    }

    /// Whether any attribute awaits upload.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.attributes.iter().any(InstancedAttribute::needs_update)
    }

    /// Acknowledges an upload of every attribute.
    pub fn clear_dirty(&mut self) {
        for attribute in &mut self.attributes {
            attribute.clear_dirty();
        }
    }
}
