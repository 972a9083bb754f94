//! # Graph Compilation Integration Test
//!
//! Builds graphs the way authoring code does and checks the emitted GLSL,
//! the uniform table and every failure mode of construction and compile.

use prism_shader::{
    compile, nodes, Binding, Filter, GraphError, NodeDef, NodeOutputs, ShaderError, ShaderGraph,
    UniformUpdate, Value, ValueType,
};

/// Master whose alpha pulses with time.
fn pulsing_graph() -> (ShaderGraph, prism_shader::NodeId) {
    let mut graph = ShaderGraph::new();
    let time = graph.node(&nodes::time()).insert().unwrap();
    let sin = graph.node(&nodes::sin()).bind("a", time).unwrap().insert().unwrap();
    let master = graph
        .node(&nodes::master())
        .bind("alpha", sin)
        .unwrap()
        .insert()
        .unwrap();
    (graph, master)
}

#[test]
fn test_time_uniform_advances() {
    let (graph, master) = pulsing_graph();
    let shader = compile(&graph, master).unwrap();

    assert_eq!(shader.uniforms().len(), 1);
    assert!(shader.vertex_source().contains("uniform float u_time;"));
    assert!(shader.fragment_source().contains("uniform float u_time;"));

    shader.update(0.5);
    shader.update(0.5);
    assert_eq!(shader.uniforms().float("u_time"), Some(1.0));

    // Clones share the same storage.
    let handle = shader.time_uniform().unwrap().clone();
    shader.update(0.25);
    assert_eq!(handle.get_float(), Some(1.25));
}

#[test]
fn test_dependency_order_and_prefixes() {
    let (graph, master) = pulsing_graph();
    let shader = compile(&graph, master).unwrap();
    let vertex = shader.vertex_source();

    // position default, time, sin, master
    assert_eq!(shader.node_count(), 4);
    let time_at = vertex.find("/*** n1: Time ***/").unwrap();
    let sin_at = vertex.find("/*** n2: Sin ***/").unwrap();
    let master_at = vertex.find("/*** n3: Master ***/").unwrap();
    assert!(time_at < sin_at && sin_at < master_at);
    assert!(vertex.contains("float in_a = n1_value;"));
    assert!(vertex.contains("float in_alpha = n2_value;"));
}

#[test]
fn test_compile_is_deterministic() {
    let (graph, master) = pulsing_graph();
    let a = compile(&graph, master).unwrap();
    let b = compile(&graph, master).unwrap();
    assert_eq!(a.vertex_source(), b.vertex_source());
    assert_eq!(a.fragment_source(), b.fragment_source());
}

#[test]
fn test_same_factory_twice_gets_distinct_names() {
    let sin = nodes::sin();
    let mut graph = ShaderGraph::new();
    let first = graph.node(&sin).bind("a", 1.0_f32).unwrap().insert().unwrap();
    let second = graph.node(&sin).bind("a", 2.0_f32).unwrap().insert().unwrap();
    let sum = graph
        .node(&nodes::add(ValueType::Float))
        .bind("a", first)
        .unwrap()
        .bind("b", second)
        .unwrap()
        .insert()
        .unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", sum).unwrap().insert().unwrap();

    let shader = compile(&graph, master).unwrap();
    let vertex = shader.vertex_source();
    assert!(vertex.contains("float n1_value;"));
    assert!(vertex.contains("float n2_value;"));
    assert!(vertex.contains("float in_a = 1.0;"));
    assert!(vertex.contains("float in_a = 2.0;"));
    assert!(vertex.contains("float in_b = n2_value;"));
}

#[test]
fn test_unused_nodes_are_not_emitted() {
    let mut graph = ShaderGraph::new();
    graph.node(&nodes::time()).insert().unwrap();
    let master = graph.node(&nodes::master()).insert().unwrap();

    let shader = compile(&graph, master).unwrap();
    assert!(shader.uniforms().is_empty());
    assert!(!shader.vertex_source().contains("u_time"));
}

#[test]
fn test_float_literal_splats_into_vector() {
    let mut graph = ShaderGraph::new();
    let master = graph
        .node(&nodes::master())
        .bind("diffuseColor", 0.5_f32)
        .unwrap()
        .insert()
        .unwrap();
    let shader = compile(&graph, master).unwrap();
    assert!(shader
        .fragment_source()
        .contains("vec3 in_diffuseColor = vec3(0.5, 0.5, 0.5);"));
}

#[test]
fn test_color_feeds_vec3() {
    let mut graph = ShaderGraph::new();
    let tint = graph
        .node(&nodes::constant(Value::Color([1.0, 0.0, 0.0])))
        .insert()
        .unwrap();
    let offset = graph
        .node(&nodes::add(ValueType::Vec3))
        .bind("a", tint)
        .unwrap()
        .bind("b", Value::Vec3([0.0, 0.0, 1.0]))
        .unwrap()
        .insert();
    assert!(offset.is_ok());
}

#[test]
fn test_output_type_mismatch_at_bind() {
    let mut graph = ShaderGraph::new();
    let position = graph.node(&nodes::vertex_position()).insert().unwrap();
    let err = graph.node(&nodes::sin()).bind("a", position).err().unwrap();

    match err {
        ShaderError::TypeMismatch {
            node,
            input,
            expected,
            found,
        } => {
            assert_eq!(node, "Sin");
            assert_eq!(input, "a");
            assert_eq!(expected, ValueType::Float);
            assert_eq!(found, ValueType::Vec3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_literal_type_mismatch_at_bind() {
    let mut graph = ShaderGraph::new();
    let err = graph
        .node(&nodes::sin())
        .bind("a", Value::Vec2([1.0, 2.0]))
        .err()
        .unwrap();
    assert!(matches!(err, ShaderError::TypeMismatch { .. }));
}

#[test]
fn test_unknown_input() {
    let mut graph = ShaderGraph::new();
    let err = graph.node(&nodes::sin()).bind("b", 1.0_f32).err().unwrap();
    assert!(matches!(err, ShaderError::UnknownInput { input, .. } if input == "b"));
}

#[test]
fn test_required_input_must_be_bound() {
    let mut graph = ShaderGraph::new();
    let err = graph.node(&nodes::sin()).insert().unwrap_err();
    assert!(matches!(err, ShaderError::UnboundInput { input, .. } if input == "a"));
    assert!(graph.is_empty());
}

#[test]
fn test_missing_output_at_bind() {
    let mut graph = ShaderGraph::new();
    let time = graph.node(&nodes::time()).insert().unwrap();
    let err = graph.node(&nodes::sin()).bind("a", time.out("nope")).err().unwrap();
    assert!(matches!(
        err,
        ShaderError::Graph(GraphError::MissingOutput { output, .. }) if output == "nope"
    ));
}

#[test]
fn test_missing_output_on_forward_reference() {
    let mut graph = ShaderGraph::new();
    let later = graph.reserve();
    let sin = graph.node(&nodes::sin()).bind("a", later.out("nope")).unwrap().insert().unwrap();
    graph.node(&nodes::time()).define(later).unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", sin).unwrap().insert().unwrap();

    let err = compile(&graph, master).unwrap_err();
    assert!(matches!(err, ShaderError::Graph(GraphError::MissingOutput { .. })));
}

#[test]
fn test_forward_reference_type_checked_at_compile() {
    let mut graph = ShaderGraph::new();
    let later = graph.reserve();
    let sin = graph.node(&nodes::sin()).bind("a", later).unwrap().insert().unwrap();
    graph.node(&nodes::vertex_position()).define(later).unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", sin).unwrap().insert().unwrap();

    let err = compile(&graph, master).unwrap_err();
    assert!(matches!(err, ShaderError::TypeMismatch { .. }));
}

#[test]
fn test_cycle_is_reported() {
    let add = nodes::add(ValueType::Float);
    let mut graph = ShaderGraph::new();
    let a = graph.reserve();
    let b = graph.node(&add).bind("a", a).unwrap().bind("b", 1.0_f32).unwrap().insert().unwrap();
    graph
        .node(&add)
        .bind("a", b)
        .unwrap()
        .bind("b", 1.0_f32)
        .unwrap()
        .define(a)
        .unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", b).unwrap().insert().unwrap();

    let err = compile(&graph, master).unwrap_err();
    match err {
        ShaderError::Graph(GraphError::Cycle { path }) => {
            assert_eq!(path.len(), 3);
            assert_eq!(path.first(), path.last());
            assert!(path.iter().all(|step| step.starts_with("Add")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_undefined_node() {
    let mut graph = ShaderGraph::new();
    let never = graph.reserve();
    let master = graph.node(&nodes::master()).bind("alpha", never).unwrap().insert().unwrap();
    let err = compile(&graph, master).unwrap_err();
    assert!(matches!(err, ShaderError::Graph(GraphError::UndefinedNode(id)) if id == never));
}

#[test]
fn test_unknown_root() {
    let graph = ShaderGraph::new();
    let err = compile(&graph, prism_shader::NodeId::from_raw(5)).unwrap_err();
    assert!(matches!(err, ShaderError::Graph(GraphError::UnknownNode(_))));
}

#[test]
fn test_define_twice_fails() {
    let mut graph = ShaderGraph::new();
    let id = graph.reserve();
    graph.node(&nodes::time()).define(id).unwrap();
    let err = graph.node(&nodes::time()).define(id).unwrap_err();
    assert!(matches!(err, ShaderError::Graph(GraphError::Arena(_))));
}

#[test]
fn test_conflicting_uniform() {
    let fake_time = NodeDef::new("FakeTime")
        .uniform("u_time", Value::Vec2([0.0, 0.0]), UniformUpdate::Static)
        .output("value", ValueType::Float, "u_time.x")
        .build();
    let mut graph = ShaderGraph::new();
    let real = graph.node(&nodes::time()).insert().unwrap();
    let fake = graph.node(&fake_time).insert().unwrap();
    let sum = graph
        .node(&nodes::add(ValueType::Float))
        .bind("a", real)
        .unwrap()
        .bind("b", fake)
        .unwrap()
        .insert()
        .unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", sum).unwrap().insert().unwrap();

    let err = compile(&graph, master).unwrap_err();
    assert!(matches!(
        err,
        ShaderError::Graph(GraphError::ConflictingUniform { name, .. }) if name == "u_time"
    ));
}

#[test]
fn test_shared_uniform_declared_once() {
    let mut graph = ShaderGraph::new();
    let a = graph.node(&nodes::time()).insert().unwrap();
    let b = graph.node(&nodes::time()).insert().unwrap();
    let sum = graph
        .node(&nodes::add(ValueType::Float))
        .bind("a", a)
        .unwrap()
        .bind("b", b)
        .unwrap()
        .insert()
        .unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", sum).unwrap().insert().unwrap();

    let shader = compile(&graph, master).unwrap();
    assert_eq!(shader.vertex_source().matches("uniform float u_time;").count(), 1);
    assert_eq!(shader.uniforms().len(), 1);
}

#[test]
fn test_root_without_injection_outputs() {
    let mut graph = ShaderGraph::new();
    let time = graph.node(&nodes::time()).insert().unwrap();
    let err = compile(&graph, time).unwrap_err();
    assert!(matches!(
        err,
        ShaderError::Graph(GraphError::MissingOutput { output, .. }) if output == "position"
    ));
}

#[test]
fn test_default_node_is_instantiated_per_use() {
    let mut graph = ShaderGraph::new();
    let wave = graph.node(&nodes::sine_wave()).insert().unwrap();
    // the wave's default time node plus the wave itself
    assert_eq!(graph.len(), 2);

    let master = graph.node(&nodes::master()).bind("alpha", wave).unwrap().insert().unwrap();
    let shader = compile(&graph, master).unwrap();
    assert!(shader.uniforms().get("u_time").is_some());
}

#[test]
fn test_varying_node_crosses_stages() {
    let mut graph = ShaderGraph::new();
    let rim = graph.node(&nodes::fresnel()).insert().unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", rim).unwrap().insert().unwrap();
    let shader = compile(&graph, master).unwrap();

    let vertex = shader.vertex_source();
    let fragment = shader.fragment_source();
    assert!(vertex.contains("varying float v_n1_value;"));
    assert!(vertex.contains("v_n1_value = n1_value;"));
    assert!(vertex.contains("cameraPosition"));
    assert!(fragment.contains("n1_value = v_n1_value;"));
    assert!(!fragment.contains("cameraPosition"));
}

#[test]
fn test_stack_chains_filters() {
    let mut graph = ShaderGraph::new();
    let base = graph.node(&nodes::vertex_position()).insert().unwrap();
    let wave = graph.node(&nodes::sine_wave()).insert().unwrap();

    let top = graph
        .stack(
            ValueType::Vec3,
            "Position",
            base,
            [
                Filter::new(&nodes::scale(ValueType::Vec3)).with("factor", wave),
                Filter::new(&nodes::add(ValueType::Vec3)).with("b", Value::Vec3([0.0, 1.0, 0.0])),
            ],
        )
        .unwrap();

    let add = graph.get(top).unwrap();
    assert_eq!(add.name(), "Add");
    let Some(Binding::Output(previous)) = add.binding("a") else {
        panic!("stack filter not chained");
    };
    assert_eq!(graph.get(previous.node).unwrap().name(), "Scale");

    let master = graph.node(&nodes::master()).bind("position", top).unwrap().insert().unwrap();
    let shader = compile(&graph, master).unwrap();
    assert!(shader.vertex_source().contains("/*** n0: VertexPosition ***/"));
    assert!(shader.vertex_source().contains(": Position ***/"));
}

#[test]
fn test_stack_rejects_wrong_filter_type() {
    let mut graph = ShaderGraph::new();
    let err = graph
        .stack(
            ValueType::Vec3,
            "Position",
            Value::Vec3([0.0, 0.0, 0.0]),
            [Filter::new(&nodes::sin())],
        )
        .unwrap_err();
    assert!(matches!(err, ShaderError::TypeMismatch { .. }));
}

#[test]
fn test_deep_stack_compiles() {
    const DEPTH: usize = 10_000;

    let mut graph = ShaderGraph::new();
    let top = graph
        .stack(
            ValueType::Float,
            "Alpha",
            1.0_f32,
            (0..DEPTH).map(|_| Filter::new(&nodes::scale(ValueType::Float))),
        )
        .unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", top).unwrap().insert().unwrap();

    let shader = compile(&graph, master).unwrap();

    // default position, pass-through head, filters, master
    assert_eq!(shader.node_count(), DEPTH + 3);
    assert!(shader.fragment_source().contains("/*** n1: Alpha ***/"));
    assert!(shader
        .fragment_source()
        .contains(&format!("/*** n{}: Master ***/", DEPTH + 2)));
}

#[test]
fn test_deep_cycle_is_reported() {
    let add = nodes::add(ValueType::Float);
    let mut graph = ShaderGraph::new();
    let first = graph.reserve();
    let mut previous = first;
    for _ in 0..5_000 {
        previous = graph
            .node(&add)
            .bind("a", previous)
            .unwrap()
            .bind("b", 1.0_f32)
            .unwrap()
            .insert()
            .unwrap();
    }
    graph.node(&add).bind("a", previous).unwrap().bind("b", 1.0_f32).unwrap().define(first).unwrap();
    let master = graph.node(&nodes::master()).bind("alpha", previous).unwrap().insert().unwrap();

    match compile(&graph, master).unwrap_err() {
        ShaderError::Graph(GraphError::Cycle { path }) => {
            assert_eq!(path.len(), 5_002);
            assert_eq!(path.first(), path.last());
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn test_failed_insert_leaves_graph_untouched() {
    let clocked = NodeDef::new("Clocked")
        .input("t", ValueType::Float, prism_shader::DefaultValue::Node(nodes::time()))
        .required_input("r", ValueType::Float)
        .output("value", ValueType::Float, "in_t * in_r")
        .build();

    let mut graph = ShaderGraph::new();
    let err = graph.node(&clocked).insert().unwrap_err();
    assert!(matches!(err, ShaderError::UnboundInput { ref input, .. } if input == "r"));
    assert_eq!(graph.len(), 0);
    assert_eq!(graph.iter().count(), 0);
}

#[test]
fn test_mistyped_default_node_leaves_graph_untouched() {
    let offset = NodeDef::new("Offset")
        .input("base", ValueType::Vec3, prism_shader::DefaultValue::Node(nodes::vertex_position()))
        .input("shift", ValueType::Vec3, prism_shader::DefaultValue::Node(nodes::time()))
        .output("value", ValueType::Vec3, "in_base + in_shift")
        .build();

    let mut graph = ShaderGraph::new();
    let err = graph.node(&offset).insert().unwrap_err();
    assert!(matches!(err, ShaderError::TypeMismatch { ref input, .. } if input == "shift"));
    assert_eq!(graph.len(), 0);
}

#[test]
fn test_failed_define_leaves_graph_untouched() {
    let mut graph = ShaderGraph::new();
    let master = graph.node(&nodes::master()).insert().unwrap();
    let before = graph.len();

    let err = graph.node(&nodes::master()).define(master).unwrap_err();
    assert!(matches!(err, ShaderError::Graph(GraphError::Arena(_))));
    assert_eq!(graph.len(), before);
}
