//! # Typed Value Model
//!
//! The closed set of GLSL-facing types a node input or output may carry, and
//! literal values of those types.
//!
//! ## Coercion
//!
//! | from \ to | same | `Vec3`/`Color` | vecN / color |
//! |-----------|------|----------------|--------------|
//! | literal   | yes  | swap freely    | `Float` splats |
//! | output    | yes  | swap freely    | no           |
//!
//! Anything else is a type mismatch.

use std::fmt;

use prism_shared::{Color, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// GLSL-facing value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Scalar.
    Float,
    /// 2-component vector.
    Vec2,
    /// 3-component vector.
    Vec3,
    /// 4-component vector.
    Vec4,
    /// RGB color, a `vec3` in GLSL.
    Color,
    /// 3x3 matrix.
    Mat3,
    /// 4x4 matrix.
    Mat4,
}

impl ValueType {
    /// Every type, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Float,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::Color,
        Self::Mat3,
        Self::Mat4,
    ];

    /// Type keyword in generated GLSL.
    #[must_use]
    pub const fn glsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 | Self::Color => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }

    /// Lowercase name used in descriptions and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Color => "color",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }

    /// Number of scalar components.
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            Self::Float => 1,
            Self::Vec2 => 2,
            Self::Vec3 | Self::Color => 3,
            Self::Vec4 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// Whether an output of type `source` may feed an input of this type.
    #[must_use]
    pub fn accepts(self, source: Self) -> bool {
        self == source
            || matches!(
                (self, source),
                (Self::Vec3, Self::Color) | (Self::Color, Self::Vec3)
            )
    }

    /// The all-zero value of this type.
    #[must_use]
    pub const fn zero(self) -> Value {
        match self {
            Self::Float => Value::Float(0.0),
            Self::Vec2 => Value::Vec2([0.0; 2]),
            Self::Vec3 => Value::Vec3([0.0; 3]),
            Self::Vec4 => Value::Vec4([0.0; 4]),
            Self::Color => Value::Color([0.0; 3]),
            Self::Mat3 => Value::Mat3([0.0; 9]),
            Self::Mat4 => Value::Mat4([0.0; 16]),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal value of one [`ValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Scalar.
    Float(f32),
    /// 2-component vector.
    Vec2([f32; 2]),
    /// 3-component vector.
    Vec3([f32; 3]),
    /// 4-component vector.
    Vec4([f32; 4]),
    /// RGB color.
    Color([f32; 3]),
    /// 3x3 matrix, column-major.
    Mat3([f32; 9]),
    /// 4x4 matrix, column-major.
    Mat4([f32; 16]),
}

impl Value {
    /// Type of this literal.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Vec2(_) => ValueType::Vec2,
            Self::Vec3(_) => ValueType::Vec3,
            Self::Vec4(_) => ValueType::Vec4,
            Self::Color(_) => ValueType::Color,
            Self::Mat3(_) => ValueType::Mat3,
            Self::Mat4(_) => ValueType::Mat4,
        }
    }

    /// Converts the literal to `target`, or `None` if no coercion exists.
    #[must_use]
    pub fn coerce_to(self, target: ValueType) -> Option<Self> {
        if self.value_type() == target {
            return Some(self);
        }
        match (self, target) {
            (Self::Color(c), ValueType::Vec3) => Some(Self::Vec3(c)),
            (Self::Vec3(v), ValueType::Color) => Some(Self::Color(v)),
            (Self::Float(s), ValueType::Vec2) => Some(Self::Vec2([s; 2])),
            (Self::Float(s), ValueType::Vec3) => Some(Self::Vec3([s; 3])),
            (Self::Float(s), ValueType::Vec4) => Some(Self::Vec4([s; 4])),
            (Self::Float(s), ValueType::Color) => Some(Self::Color([s; 3])),
            _ => None,
        }
    }

    /// The scalar, if this is a `Float`.
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar components in order.
    #[must_use]
    pub fn components(&self) -> &[f32] {
        match self {
            Self::Float(v) => std::slice::from_ref(v),
            Self::Vec2(v) => v,
            Self::Vec3(v) | Self::Color(v) => v,
            Self::Vec4(v) => v,
            Self::Mat3(v) => v,
            Self::Mat4(v) => v,
        }
    }

    /// Renders the value as a GLSL literal, e.g. `vec3(1.0, 0.5, 0.0)`.
    #[must_use]
    pub fn to_glsl(&self) -> String {
        match self {
            Self::Float(v) => glsl_float(*v),
            other => {
                let parts: Vec<String> = other.components().iter().map(|v| glsl_float(*v)).collect();
                format!("{}({})", other.value_type().glsl_name(), parts.join(", "))
            }
        }
    }
}

/// Formats a float so GLSL parses it as a float, never as an int.
#[must_use]
pub fn glsl_float(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for Value {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v.to_array())
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v.to_array())
    }
}

impl From<Vec4> for Value {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v.to_array())
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glsl_names() {
        assert_eq!(ValueType::Float.glsl_name(), "float");
        assert_eq!(ValueType::Color.glsl_name(), "vec3");
        assert_eq!(ValueType::Mat4.glsl_name(), "mat4");
        assert_eq!(ValueType::Color.components(), 3);
    }

    #[test]
    fn test_float_literals_keep_a_decimal_point() {
        assert_eq!(glsl_float(1.0), "1.0");
        assert_eq!(glsl_float(-2.0), "-2.0");
        assert_eq!(glsl_float(0.5), "0.5");
        assert_eq!(Value::Float(3.0).to_glsl(), "3.0");
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(Value::Vec3([1.0, 0.5, 0.0]).to_glsl(), "vec3(1.0, 0.5, 0.0)");
        assert_eq!(Value::Color([1.0, 1.0, 1.0]).to_glsl(), "vec3(1.0, 1.0, 1.0)");
    }

    #[test]
    fn test_coercion_rules() {
        assert_eq!(
            Value::Float(2.0).coerce_to(ValueType::Vec3),
            Some(Value::Vec3([2.0; 3]))
        );
        assert_eq!(
            Value::Color([0.1, 0.2, 0.3]).coerce_to(ValueType::Vec3),
            Some(Value::Vec3([0.1, 0.2, 0.3]))
        );
        assert_eq!(Value::Vec3([1.0; 3]).coerce_to(ValueType::Float), None);
        assert_eq!(Value::Vec2([1.0; 2]).coerce_to(ValueType::Vec3), None);
    }

    #[test]
    fn test_output_compatibility() {
        assert!(ValueType::Vec3.accepts(ValueType::Color));
        assert!(ValueType::Color.accepts(ValueType::Vec3));
        assert!(!ValueType::Vec3.accepts(ValueType::Float));
        assert!(!ValueType::Float.accepts(ValueType::Vec3));
    }
}
