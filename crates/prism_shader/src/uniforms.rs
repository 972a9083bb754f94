//! # Uniform Table
//!
//! Uniform values live behind shared `RwLock` handles. The compiled shader
//! advances them in [`UniformTable::advance`]; renderers and the particle
//! spawner read the same storage, so nobody needs to hold a borrow of the
//! shader.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ShaderError, ShaderResult};
use crate::types::{Value, ValueType};

/// Per-frame update rule attached to a uniform.
#[derive(Clone, Default)]
pub enum UniformUpdate {
    /// The value only changes when set explicitly.
    #[default]
    Static,
    /// A float accumulating the frame delta.
    ElapsedTime,
    /// Arbitrary rule: `(current, delta) -> next`.
    Custom(Arc<dyn Fn(Value, f32) -> Value + Send + Sync>),
}

impl UniformUpdate {
    /// Wraps a closure as a custom rule.
    pub fn custom(rule: impl Fn(Value, f32) -> Value + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(rule))
    }

    /// Computes the next value.
    #[must_use]
    pub fn apply(&self, current: Value, delta: f32) -> Value {
        match self {
            Self::Static => current,
            Self::ElapsedTime => match current {
                Value::Float(t) => Value::Float(t + delta),
                other => other,
            },
            Self::Custom(rule) => rule(current, delta),
        }
    }
}

impl fmt::Debug for UniformUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("Static"),
            Self::ElapsedTime => f.write_str("ElapsedTime"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A named uniform with shared storage.
///
/// Cloning the handle shares the value; it does not copy it.
#[derive(Clone)]
pub struct Uniform {
    name: Arc<str>,
    ty: ValueType,
    value: Arc<RwLock<Value>>,
    update: UniformUpdate,
}

impl Uniform {
    /// Creates a uniform holding `initial`.
    pub fn new(name: &str, initial: Value, update: UniformUpdate) -> Self {
        Self {
            name: Arc::from(name),
            ty: initial.value_type(),
            value: Arc::new(RwLock::new(initial)),
            update,
        }
    }

    /// Uniform name in GLSL.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[inline]
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Current value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Value {
        *self.value.read()
    }

    /// Current value as a float, if the uniform is a `Float`.
    #[inline]
    #[must_use]
    pub fn get_float(&self) -> Option<f32> {
        self.value.read().as_float()
    }

    /// Overwrites the value, coercing it to the declared type.
    ///
    /// # Errors
    ///
    /// [`ShaderError::TypeMismatch`] if `value` cannot be coerced.
    pub fn set(&self, value: Value) -> ShaderResult<()> {
        let coerced = value
            .coerce_to(self.ty)
            .ok_or_else(|| ShaderError::TypeMismatch {
                node: "uniform".to_string(),
                input: self.name.to_string(),
                expected: self.ty,
                found: value.value_type(),
            })?;
        *self.value.write() = coerced;
        Ok(())
    }

    /// Applies the update rule once.
    pub fn advance(&self, delta: f32) {
        if matches!(self.update, UniformUpdate::Static) {
            return;
        }
        let mut value = self.value.write();
        *value = self.update.apply(*value, delta);
    }

    /// Whether both handles point at the same storage.
    #[must_use]
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Uniform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uniform")
            .field("name", &self.name)
            .field("value", &self.get())
            .field("update", &self.update)
            .finish()
    }
}

/// Uniforms of one compiled shader, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    entries: BTreeMap<String, Uniform>,
}

impl UniformTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a uniform up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.entries.get(name)
    }

    /// Current value of a float uniform.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Uniform::get_float)
    }

    /// Number of uniforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Uniform> {
        self.entries.values()
    }

    /// Applies every update rule once.
    pub fn advance(&self, delta: f32) {
        for uniform in self.entries.values() {
            uniform.advance(delta);
        }
    }

    pub(crate) fn insert(&mut self, uniform: Uniform) {
        self.entries.insert(uniform.name().to_string(), uniform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_time_accumulates() {
        let time = Uniform::new("u_time", Value::Float(0.0), UniformUpdate::ElapsedTime);
        time.advance(0.5);
        time.advance(0.25);
        assert_eq!(time.get_float(), Some(0.75));
    }

    #[test]
    fn test_static_never_moves() {
        let tint = Uniform::new("u_tint", Value::Color([1.0; 3]), UniformUpdate::Static);
        tint.advance(10.0);
        assert_eq!(tint.get(), Value::Color([1.0; 3]));
    }

    #[test]
    fn test_custom_rule() {
        let pulse = Uniform::new(
            "u_pulse",
            Value::Float(1.0),
            UniformUpdate::custom(|value, delta| match value {
                Value::Float(v) => Value::Float(v * 2.0 + delta),
                other => other,
            }),
        );
        pulse.advance(1.0);
        assert_eq!(pulse.get_float(), Some(3.0));
    }

    #[test]
    fn test_clones_share_storage() {
        let a = Uniform::new("u_time", Value::Float(0.0), UniformUpdate::ElapsedTime);
        let b = a.clone();
        a.advance(1.0);
        assert_eq!(b.get_float(), Some(1.0));
        assert!(a.shares_storage(&b));
    }

    #[test]
    fn test_set_coerces_and_rejects() {
        let tint = Uniform::new("u_tint", Value::Vec3([0.0; 3]), UniformUpdate::Static);
        tint.set(Value::Float(0.5)).unwrap();
        assert_eq!(tint.get(), Value::Vec3([0.5; 3]));
        assert!(tint.set(Value::Vec2([1.0; 2])).is_err());
    }
}
