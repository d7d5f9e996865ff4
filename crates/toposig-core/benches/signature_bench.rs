//! # Signature Benchmarks
//!
//! Performance benchmarks for toposig-core signature operations.
//!
//! Run with: `cargo bench -p toposig-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use toposig_core::{MatchOptions, NodeDescription, NodeRecord, Signature, SignatureIndex, TopologyDiff, jaccard};

/// A node with `size` endpoints spread over the four categories.
fn create_node(size: usize) -> NodeDescription {
    let mut node = NodeDescription::new();
    for i in 0..size {
        let name = format!("/ns_{}/endpoint_{}", i % 4, i);
        let types = [format!("pkg_{}/msg/Type{}", i % 3, i % 5)];
        node = match i % 4 {
            0 => node.with_publisher(name, types),
            1 => node.with_subscriber(name, types),
            2 => node.with_service(name, types),
            _ => node.with_client(name, types),
        };
    }
    node
}

/// `count` nodes drawn from `count / 4` distinct interfaces.
fn create_nodes(count: usize) -> Vec<NodeRecord> {
    (0..count)
        .map(|i| NodeRecord::new(format!("node_{}", i), "/", create_node(4 + i % (count / 4).max(1))))
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_signature_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature_id");

    for size in [4, 32, 256].iter() {
        let node = create_node(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &node, |b, node| {
            b.iter(|| black_box(Signature::from_node(node).id()));
        });
    }

    group.finish();
}

fn bench_jaccard(c: &mut Criterion) {
    let mut group = c.benchmark_group("jaccard");

    for size in [4, 32, 256].iter() {
        let a = Signature::from_node(&create_node(*size)).token_set(true);
        let b = Signature::from_node(&create_node(size + 2)).token_set(true);
        group.bench_with_input(BenchmarkId::from_parameter(size), &(a, b), |bench, (a, b)| {
            bench.iter(|| black_box(jaccard(a, b)));
        });
    }

    group.finish();
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for count in [100, 1000].iter() {
        let nodes = create_nodes(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| black_box(SignatureIndex::build(nodes, 10)));
        });
    }

    group.finish();
}

fn bench_topology_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology_diff");
    let options = MatchOptions::default();

    for count in [50, 200].iter() {
        let old = create_nodes(*count);
        let new: Vec<NodeRecord> = old
            .iter()
            .map(|n| NodeRecord::new(format!("{}_v2", n.name), "/", n.interface.clone()))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &(old, new), |b, (old, new)| {
            b.iter(|| black_box(TopologyDiff::compute(old, new, &options)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_signature_id,
    bench_jaccard,
    bench_index_build,
    bench_topology_diff,
);

criterion_main!(benches);
