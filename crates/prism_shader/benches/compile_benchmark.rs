//! # Shader Compile Benchmark
//!
//! Compiles graphs of increasing depth. A material is usually compiled once,
//! but editors recompile on every change.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prism_shader::{compile, nodes, Filter, NodeId, ShaderGraph, ValueType};

/// Master fed by a position stack of `depth` scale filters.
fn build_stack(depth: usize) -> (ShaderGraph, NodeId) {
    let mut graph = ShaderGraph::new();
    let base = graph.node(&nodes::vertex_position()).insert().unwrap();
    let wave = graph.node(&nodes::sine_wave()).insert().unwrap();
    let scale = nodes::scale(ValueType::Vec3);

    let filters = (0..depth).map(|_| Filter::new(&scale).with("factor", wave));
    let top = graph.stack(ValueType::Vec3, "Position", base, filters).unwrap();
    let master = graph
        .node(&nodes::master())
        .bind("position", top)
        .unwrap()
        .insert()
        .unwrap();
    (graph, master)
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_stack");
    for depth in [4, 32, 256] {
        let (graph, master) = build_stack(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(compile(&graph, master).unwrap()));
        });
    }
    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let (graph, master) = build_stack(4);
    let shader = compile(&graph, master).unwrap();

    c.bench_function("uniform_update", |b| {
        b.iter(|| shader.update(black_box(1.0 / 60.0)));
    });
}

criterion_group!(benches, bench_compile, bench_update);
criterion_main!(benches);
