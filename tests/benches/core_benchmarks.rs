//! # Module Core Benchmarks
//!
//! | Component | Workload |
//! |-----------|----------|
//! | mc-01 Communication Bus | enqueue, process, fan-out |
//! | mc-02 Resource Manager | cached get, store, cache sweep |
//! | mc-03 Startup Optimizer | dependency batching |

use criterion::{criterion_group, criterion_main, Criterion};

use mc_tests::benchmarks::{mc_01_bus, mc_02_resources, mc_03_batching};

fn bus_benchmarks(c: &mut Criterion) {
    mc_01_bus::register_benchmarks(c);
}

fn resource_benchmarks(c: &mut Criterion) {
    mc_02_resources::register_benchmarks(c);
}

fn startup_benchmarks(c: &mut Criterion) {
    mc_03_batching::register_benchmarks(c);
}

criterion_group!(
    benches,
    bus_benchmarks,
    resource_benchmarks,
    startup_benchmarks
);
criterion_main!(benches);
