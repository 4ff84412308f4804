//! # MC-02 Resource Manager Benchmarks
//!
//! - Store and cached get
//! - Cache sweep over a populated LFU tier

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use mc_02_resource_manager::{CachePolicy, ResourceConfig, ResourceManager, ResourceType};

pub fn store_and_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-02/store_get");
    let resources = ResourceManager::new(ResourceConfig::default());
    for i in 0..1_000 {
        resources.store(&format!("r{i}"), json!({"value": i}), ResourceType::Data, None);
    }

    group.throughput(Throughput::Elements(1));
    group.bench_function("get_cached", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % 1_000;
            black_box(resources.get(&format!("r{i}"), None))
        })
    });
    group.bench_function("store_replace", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % 1_000;
            black_box(resources.store(&format!("r{i}"), json!(i), ResourceType::Data, None))
        })
    });
    group.finish();
}

pub fn optimize_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-02/optimize_cache");

    for entries in [100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(entries), &entries, |b, &entries| {
            b.iter(|| {
                let resources = ResourceManager::new(ResourceConfig::default());
                for i in 0..entries {
                    let id = format!("r{i}");
                    resources.store(&id, json!(i), ResourceType::Data, None);
                    resources.set_cache_policy(&id, CachePolicy::Lfu);
                }
                black_box(resources.optimize_cache())
            })
        });
    }
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    store_and_get(c);
    optimize_cache(c);
}
