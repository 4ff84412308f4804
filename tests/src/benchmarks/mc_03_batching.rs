//! # MC-03 Startup Optimizer Benchmarks
//!
//! Dependency batching over layered and chained module graphs.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};

use mc_03_startup_optimizer::algorithms::{create_load_batches, CycleHandling, ModuleRegistry};
use mc_03_startup_optimizer::ModuleLoadInfo;

/// `count` modules where each depends on up to three modules of the layer
/// before it.
fn layered_graph(count: usize, layer_width: usize) -> (Vec<String>, ModuleRegistry) {
    let names: Vec<String> = (0..count).map(|i| format!("m{i:05}")).collect();
    let mut registry = ModuleRegistry::new();
    for (i, name) in names.iter().enumerate() {
        let layer_start = (i / layer_width) * layer_width;
        let deps: Vec<String> = if layer_start == 0 {
            Vec::new()
        } else {
            let prev = layer_start - layer_width;
            (0..3).map(|k| names[prev + (i + k) % layer_width].clone()).collect()
        };
        registry.insert(
            name.clone(),
            ModuleLoadInfo::new(name.clone())
                .with_priority((i % 7) as i32)
                .with_dependencies(deps),
        );
    }
    (names, registry)
}

pub fn batching(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-03/batching");

    for count in [50usize, 500, 2_000] {
        let (names, registry) = layered_graph(count, 10);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("layered", count), &count, |b, _| {
            b.iter(|| {
                black_box(create_load_batches(
                    &names,
                    &registry,
                    4,
                    CycleHandling::ForceFirst,
                ))
            })
        });
    }
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    batching(c);
}
