//! # Particle Material Nodes
//!
//! Shader nodes that animate particles from the instanced attributes the
//! spawner writes. Everything is evaluated in the vertex stage and handed to
//! the fragment stage as varyings, since attributes only exist there.
//!
//! Age is measured against the shared time uniform, the same one
//! [`InstancedMesh::current_time`](crate::InstancedMesh::current_time)
//! reads when stamping birth times, so CPU and GPU agree on "now".

use prism_shader::{
    compile, nodes, CompiledShader, DefaultValue, NodeDef, NodeFactory, NodeId, ShaderGraph,
    ShaderResult, UniformUpdate, ValueType,
};
use prism_shared::TIME_UNIFORM;

use crate::attributes::AttributeKind;

/// Common shape of every particle node: varying, attribute declarations in
/// the vertex header, access to the time uniform.
fn particle_node(name: &str) -> NodeDef {
    NodeDef::new(name)
        .varying()
        .vertex_header(AttributeKind::glsl_declarations())
        .uniform(TIME_UNIFORM, 0.0_f32, UniformUpdate::ElapsedTime)
}

/// Seconds since birth, 0 before birth.
#[must_use]
pub fn particle_age() -> NodeFactory {
    particle_node("ParticleAge")
        .output("value", ValueType::Float, "max(u_time - time.x, 0.0)")
        .build()
}

/// Position in the lifetime: 0 at birth, 1 at death.
#[must_use]
pub fn particle_progress() -> NodeFactory {
    particle_node("ParticleProgress")
        .output(
            "value",
            ValueType::Float,
            "clamp((u_time - time.x) / max(time.y - time.x, 0.0001), 0.0, 1.0)",
        )
        .build()
}

/// 1 between birth and death, 0 otherwise.
#[must_use]
pub fn particle_alive() -> NodeFactory {
    particle_node("ParticleAlive")
        .output("value", ValueType::Float, "step(time.x, u_time) * step(u_time, time.y)")
        .build()
}

/// `position + velocity * t + acceleration * t² / 2` with `t` the age.
#[must_use]
pub fn ballistic_position() -> NodeFactory {
    particle_node("BallisticPosition")
        .input("position", ValueType::Vec3, DefaultValue::Node(nodes::vertex_position()))
        .input("age", ValueType::Float, DefaultValue::Node(particle_age()))
        .output(
            "value",
            ValueType::Vec3,
            "in_position + velocity * in_age + 0.5 * acceleration * in_age * in_age",
        )
        .build()
}

/// Scale interpolated from birth to death.
#[must_use]
pub fn particle_scale() -> NodeFactory {
    particle_node("ParticleScale")
        .input("progress", ValueType::Float, DefaultValue::Node(particle_progress()))
        .output("value", ValueType::Vec3, "mix(scale0, scale1, in_progress)")
        .build()
}

/// Color interpolated from birth to death.
#[must_use]
pub fn particle_color() -> NodeFactory {
    particle_node("ParticleColor")
        .input("progress", ValueType::Float, DefaultValue::Node(particle_progress()))
        .output("value", ValueType::Color, "mix(color0.rgb, color1.rgb, in_progress)")
        .build()
}

/// Alpha interpolated from birth to death.
#[must_use]
pub fn particle_alpha() -> NodeFactory {
    particle_node("ParticleAlpha")
        .input("progress", ValueType::Float, DefaultValue::Node(particle_progress()))
        .output("value", ValueType::Float, "mix(color0.a, color1.a, in_progress)")
        .build()
}

/// Inserts a complete particle master: scaled, ballistic position;
/// interpolated color; alpha faded over the lifetime and hidden outside it.
///
/// # Errors
///
/// Propagates graph construction errors.
pub fn particle_master(graph: &mut ShaderGraph) -> ShaderResult<NodeId> {
    let vertex = graph.node(&nodes::vertex_position()).insert()?;
    let scale = graph.node(&particle_scale()).insert()?;
    let scaled = graph
        .node(&nodes::multiply(ValueType::Vec3))
        .bind("a", vertex)?
        .bind("b", scale)?
        .insert()?;
    let position = graph
        .node(&ballistic_position())
        .bind("position", scaled)?
        .insert()?;

    let color = graph.node(&particle_color()).insert()?;
    let alpha = graph.node(&particle_alpha()).insert()?;
    let alive = graph.node(&particle_alive()).insert()?;
    let visible = graph
        .node(&nodes::multiply(ValueType::Float))
        .bind("a", alpha)?
        .bind("b", alive)?
        .insert()?;

    graph
        .node(&nodes::master())
        .bind("position", position)?
        .bind("diffuseColor", color)?
        .bind("alpha", visible)?
        .insert()
}

/// Builds and compiles the default particle material.
///
/// # Errors
///
/// Propagates graph construction and compile errors.
pub fn particle_material() -> ShaderResult<CompiledShader> {
    let mut graph = ShaderGraph::new();
    let master = particle_master(&mut graph)?;
    compile(&graph, master)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_compiles() {
        let material = particle_material().unwrap();
        let vertex = material.vertex_source();

        assert_eq!(vertex.matches("attribute vec2 time;").count(), 1);
        assert!(vertex.contains("velocity * in_age"));
        assert!(vertex.contains("csm_Position = "));
        assert!(!material.fragment_source().contains("attribute"));
        assert_eq!(material.uniforms().len(), 1);
        assert!(material.time_uniform().is_some());
    }

    #[test]
    fn test_ballistic_defaults_instantiate_sources() {
        let mut graph = ShaderGraph::new();
        graph.node(&ballistic_position()).insert().unwrap();
        // vertex position, age, ballistic
        assert_eq!(graph.len(), 3);
    }
}
