//! # MC-01 Communication Bus Benchmarks
//!
//! - Enqueue throughput across mixed priorities
//! - Enqueue plus one processing pass at several batch sizes
//! - Fan-out to many subscribers

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::time::Duration;

use mc_01_communication_bus::{BusConfig, CommunicationBus, Message, MessagePriority};

const PRIORITIES: [MessagePriority; 5] = [
    MessagePriority::Critical,
    MessagePriority::High,
    MessagePriority::Normal,
    MessagePriority::Low,
    MessagePriority::Background,
];

fn bus(batch_size: usize) -> CommunicationBus {
    CommunicationBus::new(BusConfig {
        batch_size,
        max_queue_size: 100_000,
        ..BusConfig::default()
    })
}

pub fn enqueue_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-01/enqueue");
    group.measurement_time(Duration::from_secs(5));

    for count in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let bus = bus(100);
                for i in 0..count {
                    let message = Message::data("bench", "sink", json!(i))
                        .with_priority(PRIORITIES[i % PRIORITIES.len()]);
                    black_box(bus.send(message));
                }
                bus.queue_size()
            })
        });
    }
    group.finish();
}

pub fn process_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-01/process");
    group.measurement_time(Duration::from_secs(5));

    for batch_size in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("batch", batch_size),
            &batch_size,
            |b, &batch_size| {
                let bus = bus(batch_size);
                b.iter(|| {
                    for i in 0..batch_size {
                        bus.send(Message::data("bench", "sink", json!(i)));
                    }
                    black_box(bus.process_queue())
                })
            },
        );
    }
    group.finish();
}

pub fn fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-01/fan_out");

    for subscribers in [1usize, 10, 100] {
        let bus = bus(100);
        for i in 0..subscribers {
            bus.subscribe(&format!("module-{i}"), "bench.*");
        }
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    bus.send_event("bench", "bench.tick", json!(null));
                    black_box(bus.process_queue())
                })
            },
        );
    }
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    enqueue_throughput(c);
    process_throughput(c);
    fan_out(c);
}
