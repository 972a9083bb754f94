//! # Node Library
//!
//! Ready-made factories. Each call returns a fresh factory; instantiate it
//! as often as needed.
//!
//! Vertex stage code may use the host material's built-ins (`position`,
//! `normal`, `uv`, `modelMatrix`, `cameraPosition`); nodes that read them
//! are `varying` so the fragment stage gets the interpolated result.

use prism_shared::{Color, TIME_UNIFORM};

use crate::node::{DefaultValue, NodeDef, NodeFactory};
use crate::types::{Value, ValueType};
use crate::uniforms::UniformUpdate;

// =============================================================================
// SOURCES
// =============================================================================

/// Elapsed time in seconds, backed by the shared time uniform.
#[must_use]
pub fn time() -> NodeFactory {
    NodeDef::new("Time")
        .uniform(TIME_UNIFORM, 0.0_f32, UniformUpdate::ElapsedTime)
        .output("value", ValueType::Float, TIME_UNIFORM)
        .build()
}

/// Object-space vertex position.
#[must_use]
pub fn vertex_position() -> NodeFactory {
    NodeDef::new("VertexPosition")
        .varying()
        .output("value", ValueType::Vec3, "position")
        .build()
}

/// Object-space vertex normal.
#[must_use]
pub fn vertex_normal() -> NodeFactory {
    NodeDef::new("VertexNormal")
        .varying()
        .output("value", ValueType::Vec3, "normal")
        .build()
}

/// Texture coordinates.
#[must_use]
pub fn uv() -> NodeFactory {
    NodeDef::new("UV")
        .varying()
        .output("value", ValueType::Vec2, "uv")
        .build()
}

/// A constant of the literal's type.
#[must_use]
pub fn constant(value: impl Into<Value>) -> NodeFactory {
    let value = value.into();
    NodeDef::new("Constant")
        .output("value", value.value_type(), value.to_glsl())
        .build()
}

/// Forwards `a` unchanged. Heads every stack.
#[must_use]
pub fn pass_through(name: &str, ty: ValueType) -> NodeFactory {
    NodeDef::new(name)
        .required_input("a", ty)
        .output("value", ty, "in_a")
        .build()
}

// =============================================================================
// MATH
// =============================================================================

fn binary(name: &str, ty: ValueType, op: &str) -> NodeFactory {
    NodeDef::new(name)
        .required_input("a", ty)
        .required_input("b", ty)
        .output("value", ty, format!("in_a {op} in_b"))
        .build()
}

/// `a + b`.
#[must_use]
pub fn add(ty: ValueType) -> NodeFactory {
    binary("Add", ty, "+")
}

/// `a - b`.
#[must_use]
pub fn subtract(ty: ValueType) -> NodeFactory {
    binary("Subtract", ty, "-")
}

/// Component-wise `a * b`.
#[must_use]
pub fn multiply(ty: ValueType) -> NodeFactory {
    binary("Multiply", ty, "*")
}

/// Component-wise `a / b`.
#[must_use]
pub fn divide(ty: ValueType) -> NodeFactory {
    binary("Divide", ty, "/")
}

/// `a * factor` with a scalar factor (default 1).
#[must_use]
pub fn scale(ty: ValueType) -> NodeFactory {
    NodeDef::new("Scale")
        .required_input("a", ty)
        .input("factor", ValueType::Float, 1.0_f32)
        .output("value", ty, "in_a * in_factor")
        .build()
}

/// `sin(a)`.
#[must_use]
pub fn sin() -> NodeFactory {
    NodeDef::new("Sin")
        .required_input("a", ValueType::Float)
        .output("value", ValueType::Float, "sin(in_a)")
        .build()
}

/// `cos(a)`.
#[must_use]
pub fn cos() -> NodeFactory {
    NodeDef::new("Cos")
        .required_input("a", ValueType::Float)
        .output("value", ValueType::Float, "cos(in_a)")
        .build()
}

/// `sin(time * frequency) * amplitude`; `time` defaults to a fresh
/// [`time`] node.
#[must_use]
pub fn sine_wave() -> NodeFactory {
    NodeDef::new("SineWave")
        .input("time", ValueType::Float, DefaultValue::Node(time()))
        .input("frequency", ValueType::Float, 1.0_f32)
        .input("amplitude", ValueType::Float, 1.0_f32)
        .output(
            "value",
            ValueType::Float,
            "sin(in_time * in_frequency) * in_amplitude",
        )
        .build()
}

/// Linear blend from `a` to `b` by `amount`.
#[must_use]
pub fn mix(ty: ValueType) -> NodeFactory {
    NodeDef::new("Mix")
        .required_input("a", ty)
        .required_input("b", ty)
        .input("amount", ValueType::Float, 0.5_f32)
        .output("value", ty, "mix(in_a, in_b, in_amount)")
        .build()
}

/// Builds a `vec3` from three floats.
#[must_use]
pub fn join() -> NodeFactory {
    NodeDef::new("Join")
        .input("x", ValueType::Float, 0.0_f32)
        .input("y", ValueType::Float, 0.0_f32)
        .input("z", ValueType::Float, 0.0_f32)
        .output("value", ValueType::Vec3, "vec3(in_x, in_y, in_z)")
        .build()
}

/// Splits a `vec3` into `x`, `y` and `z` outputs.
#[must_use]
pub fn split() -> NodeFactory {
    NodeDef::new("Split")
        .required_input("a", ValueType::Vec3)
        .output("x", ValueType::Float, "in_a.x")
        .output("y", ValueType::Float, "in_a.y")
        .output("z", ValueType::Float, "in_a.z")
        .build()
}

// =============================================================================
// LIGHTING
// =============================================================================

/// Fresnel rim term, computed per vertex.
#[must_use]
pub fn fresnel() -> NodeFactory {
    NodeDef::new("Fresnel")
        .varying()
        .input("bias", ValueType::Float, 0.0_f32)
        .input("intensity", ValueType::Float, 1.0_f32)
        .input("power", ValueType::Float, 2.0_f32)
        .declare_output("value", ValueType::Float)
        .vertex_body(
            "vec3 worldPosition = (modelMatrix * vec4(position, 1.0)).xyz;\n\
             vec3 worldNormal = normalize(mat3(modelMatrix) * normal);\n\
             vec3 incident = worldPosition - cameraPosition;\n\
             out_value = in_bias + in_intensity * pow(1.0 + dot(normalize(incident), worldNormal), in_power);",
        )
        .build()
}

// =============================================================================
// MASTER
// =============================================================================

/// Root node feeding the host material.
///
/// Outputs `position`, `diffuseColor` and `alpha` are what the compiler's
/// injection templates refer to.
#[must_use]
pub fn master() -> NodeFactory {
    NodeDef::new("Master")
        .input("position", ValueType::Vec3, DefaultValue::Node(vertex_position()))
        .input("diffuseColor", ValueType::Color, Color::WHITE)
        .input("alpha", ValueType::Float, 1.0_f32)
        .output("position", ValueType::Vec3, "in_position")
        .output("diffuseColor", ValueType::Color, "in_diffuseColor")
        .output("alpha", ValueType::Float, "in_alpha")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_declares_shared_uniform() {
        let time = time();
        assert_eq!(time.uniforms().len(), 1);
        assert_eq!(time.uniforms()[0].name, TIME_UNIFORM);
    }

    #[test]
    fn test_typed_math() {
        let add = add(ValueType::Vec3);
        assert_eq!(add.find_output("value").map(|o| o.ty), Some(ValueType::Vec3));
        assert_eq!(
            add.find_output("value").and_then(|o| o.expr.as_deref()),
            Some("in_a + in_b")
        );
    }

    #[test]
    fn test_constant_uses_literal_type() {
        let c = constant(Value::Vec3([0.5, 0.5, 1.0]));
        let out = c.find_output("value").unwrap();
        assert_eq!(out.ty, ValueType::Vec3);
        assert_eq!(out.expr.as_deref(), Some("vec3(0.5, 0.5, 1.0)"));
    }

    #[test]
    fn test_master_outputs() {
        let master = master();
        for name in ["position", "diffuseColor", "alpha"] {
            assert!(master.find_output(name).is_some(), "{name}");
        }
    }
}
