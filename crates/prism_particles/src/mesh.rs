//! # Instanced Mesh Seam
//!
//! The spawner writes instance transforms and reads the current time through
//! [`InstancedMesh`]; renderers implement it over their own GPU objects.
//! [`InstanceBuffer`] is the CPU-side implementation: pre-allocated matrices
//! plus the live time uniform of a compiled material.

use prism_core::DirtyRange;
use prism_shader::{CompiledShader, Uniform};
use prism_shared::{Mat4, MATRIX_ITEM_SIZE};

/// What the spawner needs from an instanced mesh.
pub trait InstancedMesh {
    /// Instances the mesh can hold.
    fn capacity(&self) -> usize;

    /// Writes the transform of instance `index`.
    fn set_matrix_at(&mut self, index: usize, matrix: Mat4);

    /// Instances currently drawn.
    fn count(&self) -> usize;

    /// Sets the number of instances drawn.
    fn set_count(&mut self, count: usize);

    /// Current value of the material's time uniform, in seconds.
    fn current_time(&self) -> f32;

    /// Marks `count` transforms from `offset` for upload.
    fn mark_matrices_dirty(&mut self, offset: usize, count: usize);

    /// Acknowledges an upload of the transforms.
    fn clear_matrices_dirty(&mut self);
}

/// Pre-allocated instance transforms.
///
/// Capacity is fixed at creation; writes past it are ignored.
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    matrices: Box<[Mat4]>,
    count: usize,
    time: Option<Uniform>,
    dirty: DirtyRange,
}

impl InstanceBuffer {
    /// Creates a buffer of `capacity` identity transforms with no time
    /// source; [`current_time`](InstancedMesh::current_time) reads 0.
    ///
    /// # Note
    /// This allocates all matrices up front. Call once during setup.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            matrices: vec![Mat4::IDENTITY; capacity].into_boxed_slice(),
            count: 0,
            time: None,
            dirty: DirtyRange::new(),
        }
    }

    /// Creates a buffer reading time from `time`.
    #[must_use]
    pub fn with_time(capacity: usize, time: Uniform) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.time = Some(time);
        buffer
    }

    /// Creates a buffer drawn with `material`, sharing its time uniform.
    #[must_use]
    pub fn for_material(capacity: usize, material: &CompiledShader) -> Self {
        let mut buffer = Self::new(capacity);
        buffer.time = material.time_uniform().cloned();
        buffer
    }

    /// Replaces the time source.
    pub fn set_time_uniform(&mut self, time: Option<Uniform>) {
        self.time = time;
    }

    /// Transform of instance `index`.
    #[must_use]
    pub fn matrix_at(&self, index: usize) -> Option<&Mat4> {
        self.matrices.get(index)
    }

    /// All transforms.
    #[must_use]
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// All transforms as bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    /// Transforms written since the last upload.
    #[must_use]
    pub const fn dirty(&self) -> DirtyRange {
        self.dirty
    }

    /// Dirty window in floats: `(offset, count)`.
    #[must_use]
    pub const fn update_range(&self) -> (usize, usize) {
        self.dirty.scaled(MATRIX_ITEM_SIZE)
    }
}

impl InstancedMesh for InstanceBuffer {
    fn capacity(&self) -> usize {
        self.matrices.len()
    }

    #[inline]
    fn set_matrix_at(&mut self, index: usize, matrix: Mat4) {
        if let Some(slot) = self.matrices.get_mut(index) {
            *slot = matrix;
        }
    }

    fn count(&self) -> usize {
        self.count
    }

    fn set_count(&mut self, count: usize) {
        self.count = count.min(self.matrices.len());
    }

    #[inline]
    fn current_time(&self) -> f32 {
        self.time.as_ref().and_then(Uniform::get_float).unwrap_or(0.0)
    }

    fn mark_matrices_dirty(&mut self, offset: usize, count: usize) {
        self.dirty.mark(offset, count);
    }

    fn clear_matrices_dirty(&mut self) {
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_shader::{UniformUpdate, Value};
    use prism_shared::{Quaternion, Vec3};

    #[test]
    fn test_preallocated_identity() {
        let buffer = InstanceBuffer::new(8);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.count(), 0);
        assert_eq!(buffer.matrix_at(7), Some(&Mat4::IDENTITY));
        assert_eq!(buffer.as_bytes().len(), 8 * 16 * 4);
    }

    #[test]
    fn test_writes_past_capacity_are_ignored() {
        let mut buffer = InstanceBuffer::new(2);
        let moved = Mat4::compose(Vec3::X, Quaternion::IDENTITY, Vec3::ONE);
        buffer.set_matrix_at(1, moved);
        buffer.set_matrix_at(2, moved);
        buffer.set_count(5);
        assert_eq!(buffer.matrix_at(1), Some(&moved));
        assert_eq!(buffer.count(), 2);
    }

    #[test]
    fn test_time_is_read_live() {
        let time = Uniform::new("u_time", Value::Float(0.0), UniformUpdate::ElapsedTime);
        let buffer = InstanceBuffer::with_time(1, time.clone());
        assert_eq!(buffer.current_time(), 0.0);
        time.advance(0.5);
        assert_eq!(buffer.current_time(), 0.5);
    }

    #[test]
    fn test_matrix_update_range() {
        let mut buffer = InstanceBuffer::new(10);
        buffer.mark_matrices_dirty(2, 3);
        assert_eq!(buffer.update_range(), (32, 48));
        buffer.clear_matrices_dirty();
        assert!(!buffer.dirty().is_dirty());
    }
}
