//! # End-to-End Scenarios
//!
//! Ordering, overflow, expiry, batching and scoring scenarios exercised
//! through the public API of a `ModuleCore`.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use mc_01_communication_bus::{BusConfig, Message, MessagePriority};
    use mc_02_resource_manager::{CachePolicy, ResourceType};
    use mc_03_startup_optimizer::ModuleLoadInfo;
    use mc_04_performance_integrator::{
        performance_score, CoreConfig, PerformanceLevel, ScoreInputs,
    };

    use crate::integration::fixtures::{test_core, ScriptedLoader, TestCore};

    fn core_with_bus(bus: BusConfig) -> TestCore {
        test_core(
            CoreConfig {
                bus,
                ..CoreConfig::default()
            },
            ScriptedLoader::new(),
        )
    }

    fn drain_payloads(inbox: &mut mc_01_communication_bus::ModuleInbox) -> Vec<serde_json::Value> {
        let mut payloads = Vec::new();
        while let Ok(Some(message)) = inbox.try_recv() {
            payloads.push(message.payload.clone());
        }
        payloads
    }

    #[test]
    fn test_priority_order_within_one_tick() {
        let t = core_with_bus(BusConfig {
            batch_size: 10,
            ..BusConfig::default()
        });
        let bus = t.core.communication_bus();
        let mut inbox = bus.inbox("sink");

        for (label, priority) in [
            ("low", MessagePriority::Low),
            ("critical", MessagePriority::Critical),
            ("normal", MessagePriority::Normal),
        ] {
            bus.send(Message::data("src", "sink", json!(label)).with_priority(priority));
        }
        assert_eq!(bus.process_queue(), 3);

        assert_eq!(
            drain_payloads(&mut inbox),
            vec![json!("critical"), json!("normal"), json!("low")]
        );
    }

    #[test]
    fn test_overflow_evicts_background_first() {
        let t = core_with_bus(BusConfig {
            max_queue_size: 2,
            ..BusConfig::default()
        });
        let bus = t.core.communication_bus();
        let mut inbox = bus.inbox("sink");

        for (label, priority) in [
            ("background", MessagePriority::Background),
            ("low", MessagePriority::Low),
            ("critical", MessagePriority::Critical),
        ] {
            assert!(bus.send(Message::data("src", "sink", json!(label)).with_priority(priority)));
        }
        assert_eq!(bus.queue_size(), 2);
        assert_eq!(bus.performance_metrics().dropped_messages, 1);

        bus.flush();
        assert_eq!(
            drain_payloads(&mut inbox),
            vec![json!("critical"), json!("low")]
        );
    }

    #[test]
    fn test_expired_message_never_delivered() {
        let t = core_with_bus(BusConfig::default());
        let bus = t.core.communication_bus();
        let mut inbox = bus.inbox("sink");

        let now = 1_000;
        bus.send(Message::data("src", "sink", json!("stale")).with_expire_time(now + 50));
        t.clock.advance(100);

        assert_eq!(bus.process_queue(), 0);
        assert!(drain_payloads(&mut inbox).is_empty());
        assert_eq!(bus.performance_metrics().dropped_messages, 1);
    }

    #[test]
    fn test_dependency_batches() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let optimizer = t.core.startup_optimizer();
        optimizer.enable_parallel_loading(true, 2);
        optimizer.set_module_load_info("A", ModuleLoadInfo::new("A"));
        optimizer.set_module_load_info("B", ModuleLoadInfo::new("B").with_dependencies(["A"]));
        optimizer.set_module_load_info("C", ModuleLoadInfo::new("C").with_dependencies(["A"]));

        let mut batches =
            optimizer.create_load_batches(&["A".to_string(), "B".to_string(), "C".to_string()]);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec!["A".to_string()]);
        batches[1].sort();
        assert_eq!(batches[1], vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_cycle_still_loads_every_module_once() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let optimizer = t.core.startup_optimizer();
        optimizer.set_module_load_info("A", ModuleLoadInfo::new("A").with_dependencies(["B"]));
        optimizer.set_module_load_info("B", ModuleLoadInfo::new("B").with_dependencies(["A"]));

        let batches = optimizer.create_load_batches(&["A".to_string(), "B".to_string()]);
        let mut all: Vec<String> = batches.into_iter().flatten().collect();
        all.sort();
        assert_eq!(all, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_optimize_cache_is_idempotent() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let resources = t.core.resource_manager();
        for i in 0..20 {
            let id = format!("r{i:02}");
            resources.store(&id, json!(i), ResourceType::Data, None);
            resources.set_cache_policy(&id, CachePolicy::Lfu);
            for _ in 0..i {
                resources.get(&id, None);
            }
        }

        assert_eq!(resources.optimize_cache(), 2);
        assert_eq!(resources.optimize_cache(), 0);
        assert_eq!(resources.resource_count(), 20);
    }

    #[test]
    fn test_perfect_snapshot_is_excellent() {
        let score = performance_score(&ScoreInputs::default());
        assert_eq!(score, 100);
        assert_eq!(PerformanceLevel::from_score(score), PerformanceLevel::Excellent);

        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let metrics = t.core.performance_integrator().update_performance_metrics();
        assert_eq!(metrics.performance_score, 100);
        assert_eq!(metrics.performance_level, PerformanceLevel::Excellent);
    }

    proptest! {
        #[test]
        fn prop_store_then_get_round_trips(
            id in "[a-z]{1,12}",
            value in any::<i64>(),
            module in proptest::option::of("[a-z]{1,6}"),
        ) {
            let t = test_core(CoreConfig::default(), ScriptedLoader::new());
            let resources = t.core.resource_manager();
            let module = module.as_deref();
            prop_assert!(resources.store(&id, json!(value), ResourceType::Data, module));
            prop_assert_eq!(resources.get(&id, module), Some(json!(value)));
        }

        #[test]
        fn prop_every_message_delivered_in_priority_order(
            priorities in proptest::collection::vec(0usize..5, 1..40),
        ) {
            let t = core_with_bus(BusConfig::default());
            let bus = t.core.communication_bus();
            let mut inbox = bus.inbox("sink");
            let levels = [
                MessagePriority::Critical,
                MessagePriority::High,
                MessagePriority::Normal,
                MessagePriority::Low,
                MessagePriority::Background,
            ];

            for (seq, p) in priorities.iter().enumerate() {
                bus.send(
                    Message::data("src", "sink", json!([*p, seq])).with_priority(levels[*p]),
                );
            }
            bus.flush();

            let delivered: Vec<(u64, u64)> = drain_payloads(&mut inbox)
                .iter()
                .map(|v| (v[0].as_u64().unwrap_or(0), v[1].as_u64().unwrap_or(0)))
                .collect();
            prop_assert_eq!(delivered.len(), priorities.len());
            let mut sorted = delivered.clone();
            sorted.sort();
            prop_assert_eq!(delivered, sorted);
        }
    }
}
