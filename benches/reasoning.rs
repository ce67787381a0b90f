//! Benchmarks for the reasoning operations on a synthetic layered graph.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tekhne::budget::Budget;
use tekhne::graph::memory::MemoryGraph;
use tekhne::graph::{Edge, Node, RelationType};
use tekhne::pathfind;
use tekhne::resolve::{self, CyclePolicy};

const LAYERS: usize = 6;
const WIDTH: usize = 20;

/// Layered DAG: every node depends on two nodes in the next layer, plus
/// alternative edges within each layer.
fn layered_graph() -> Arc<MemoryGraph> {
    let g = MemoryGraph::new();
    let id = |layer: usize, i: usize| format!("l{layer}n{i}");

    for layer in 0..LAYERS {
        for i in 0..WIDTH {
            g.insert_node(
                Node::new(id(layer, i), format!("L{layer} N{i}"))
                    .with_category(format!("layer-{layer}"))
                    .with_trust(0.7 + 0.3 * (i as f64 / WIDTH as f64)),
            )
            .unwrap();
        }
    }
    for layer in 0..LAYERS - 1 {
        for i in 0..WIDTH {
            for offset in [0, 7] {
                let target = id(layer + 1, (i + offset) % WIDTH);
                g.insert_edge(
                    Edge::new(id(layer, i), RelationType::DependsOn, target)
                        .with_trust(0.75 + 0.2 * (offset as f64 / 10.0)),
                )
                .unwrap();
            }
        }
    }
    for layer in 0..LAYERS {
        for i in 0..WIDTH - 1 {
            g.insert_edge(
                Edge::new(
                    id(layer, i),
                    RelationType::AlternativeTo,
                    id(layer, i + 1),
                )
                .with_trust(0.8),
            )
            .unwrap();
        }
    }
    Arc::new(g)
}

fn bench_resolve(c: &mut Criterion) {
    let graph = layered_graph();
    c.bench_function("resolve_deps_layered", |bench| {
        bench.iter(|| {
            black_box(
                resolve::resolve_dependencies(
                    graph.as_ref(),
                    "l0n0",
                    LAYERS,
                    0.7,
                    CyclePolicy::Fail,
                    &mut Budget::unlimited(),
                )
                .unwrap(),
            )
        })
    });
}

fn bench_find_paths(c: &mut Criterion) {
    let graph = layered_graph();
    c.bench_function("find_paths_unidirectional", |bench| {
        bench.iter(|| {
            black_box(
                pathfind::find_paths(
                    graph.as_ref(),
                    "l0n0",
                    "l3n0",
                    3,
                    None,
                    0.7,
                    5,
                    99,
                    &mut Budget::unlimited(),
                )
                .unwrap(),
            )
        })
    });
    c.bench_function("find_paths_bidirectional", |bench| {
        bench.iter(|| {
            black_box(
                pathfind::find_paths(
                    graph.as_ref(),
                    "l0n0",
                    "l4n0",
                    4,
                    None,
                    0.7,
                    5,
                    4,
                    &mut Budget::unlimited(),
                )
                .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_resolve, bench_find_paths);
criterion_main!(benches);
