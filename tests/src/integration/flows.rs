//! # Integration Test Flows
//!
//! Tests that the bus, resource manager, startup optimizer and performance
//! integrator work together when owned by one `ModuleCore`.
//!
//! ## Flows Tested:
//!
//! 1. **Bus → Resources**: a module caches state it received as an event
//! 2. **Request / Response**: correlation ids survive the round trip
//! 3. **Startup**: dependency batches, failures and integrator metrics
//! 4. **Health**: bus drops and memory pressure reach the integrator

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::timeout;

    use mc_01_communication_bus::{BusConfig, Message, MessagePriority, MessageType};
    use mc_02_resource_manager::{ResourceConfig, ResourceType};
    use mc_03_startup_optimizer::{ModuleLoadInfo, OptimizerEvent, SessionState};
    use mc_04_performance_integrator::{
        severity, CoreConfig, IntegratorEvent, OptimizationCategory, PerformanceLevel,
    };

    use crate::integration::fixtures::{test_core, ScriptedLoader};

    // =============================================================================
    // BUS → RESOURCES
    // =============================================================================

    #[test]
    fn test_event_payload_cached_by_subscriber() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let bus = t.core.communication_bus();
        let resources = t.core.resource_manager();

        assert!(bus.subscribe("ui", "settings.*"));
        let mut inbox = bus.inbox("ui");

        assert!(bus.send_event("settings", "settings.theme", json!({"theme": "dark"})));
        assert_eq!(bus.process_queue(), 1);

        let message = inbox.try_recv().unwrap().expect("event delivered");
        assert_eq!(message.event_name(), Some("settings.theme"));

        assert!(resources.store(
            "theme",
            message.payload.clone(),
            ResourceType::Configuration,
            Some("ui"),
        ));
        assert_eq!(
            resources.get("theme", Some("ui")),
            Some(json!({"theme": "dark"}))
        );
        assert_eq!(resources.get("theme", None), None);
    }

    #[test]
    fn test_unsubscribed_module_receives_nothing() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let bus = t.core.communication_bus();
        bus.subscribe("ui", "settings.*");
        let mut audio = bus.inbox("audio");

        bus.send_event("settings", "settings.volume", json!(3));
        bus.process_queue();
        assert!(audio.try_recv().unwrap().is_none());
    }

    // =============================================================================
    // REQUEST / RESPONSE
    // =============================================================================

    #[test]
    fn test_request_response_round_trip() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let bus = t.core.communication_bus();
        let mut settings = bus.inbox("settings");
        let mut ui = bus.inbox("ui");

        let correlation_id = bus
            .send_request("ui", "settings", "get", json!({"key": "theme"}))
            .expect("request accepted");
        bus.process_queue();

        let request = settings.try_recv().unwrap().expect("request delivered");
        assert_eq!(request.message_type, MessageType::Request);
        assert!(bus.send_response("settings", &request, json!("dark")));
        bus.process_queue();

        let response = ui.try_recv().unwrap().expect("response delivered");
        assert_eq!(response.message_type, MessageType::Response);
        assert_eq!(response.correlation_id, correlation_id);
        assert_eq!(response.payload, json!("dark"));
    }

    #[test]
    fn test_directed_command_without_receiver_is_rejected() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let bus = t.core.communication_bus();
        assert!(!bus.send(Message::command("ui", "", "reload", json!(null))));
        assert_eq!(bus.queue_size(), 0);
        assert_eq!(bus.performance_metrics().total_messages, 0);
    }

    // =============================================================================
    // STARTUP
    // =============================================================================

    #[tokio::test]
    async fn test_startup_session_respects_dependencies() {
        let loader = ScriptedLoader::new()
            .delayed("config", Duration::from_millis(20))
            .with_memory("ui", 2_048);
        let t = test_core(CoreConfig::default(), loader);
        let optimizer = t.core.startup_optimizer();
        optimizer.enable_parallel_loading(true, 2);
        optimizer.set_module_load_info("config", ModuleLoadInfo::new("config"));
        optimizer.set_module_load_info(
            "ui",
            ModuleLoadInfo::new("ui").with_dependencies(["config"]),
        );
        optimizer.set_module_load_info(
            "audio",
            ModuleLoadInfo::new("audio").with_dependencies(["config"]),
        );

        let session = t
            .core
            .load_modules(vec!["audio".into(), "ui".into(), "config".into()])
            .await;

        assert_eq!(session.state, SessionState::Completed);
        assert_eq!(session.success_count, 3);
        assert_eq!(session.batches.len(), 2);
        assert_eq!(session.batches[0], vec!["config".to_string()]);
        assert_eq!(t.loader.finished().first().map(String::as_str), Some("config"));
        assert_eq!(session.module_memory_usage.get("ui"), Some(&2_048));
    }

    #[tokio::test]
    async fn test_failed_module_does_not_stop_session() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new().failing("video"));
        let mut events = t.core.startup_optimizer().events();

        let session = t
            .core
            .load_modules(vec!["video".into(), "audio".into()])
            .await;

        assert_eq!(session.state, SessionState::Failed);
        assert_eq!(session.success_count, 1);
        assert_eq!(session.failure_count, 1);
        assert!(session
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("video")));

        let mut failed = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let OptimizerEvent::ModuleLoadFailed { module, .. } = event {
                failed.push(module);
            }
        }
        assert_eq!(failed, vec!["video".to_string()]);

        let metrics = t.core.performance_integrator().update_performance_metrics();
        assert_eq!(metrics.active_modules, 1);
        assert_eq!(metrics.startup.failed_modules, 1);
    }

    // =============================================================================
    // HEALTH
    // =============================================================================

    #[test]
    fn test_bus_drops_lower_the_score() {
        let config = CoreConfig {
            bus: BusConfig {
                max_queue_size: 2,
                ..BusConfig::default()
            },
            ..CoreConfig::default()
        };
        let t = test_core(config, ScriptedLoader::new());
        let bus = t.core.communication_bus();
        for i in 0..3 {
            let message = Message::data("ui", "settings", json!(i))
                .with_priority(MessagePriority::Low);
            assert!(bus.send(message));
        }

        let metrics = t.core.performance_integrator().update_performance_metrics();
        assert_eq!(metrics.communication.dropped_messages, 1);
        assert_eq!(metrics.performance_score, 90);
        assert_eq!(metrics.performance_level, PerformanceLevel::Excellent);
    }

    #[tokio::test]
    async fn test_memory_warning_reaches_integrator() {
        let config = CoreConfig {
            resources: ResourceConfig {
                max_memory_bytes: 8,
                ..ResourceConfig::default()
            },
            ..CoreConfig::default()
        };
        let t = test_core(config, ScriptedLoader::new());
        let integrator = t.core.performance_integrator();
        let mut events = integrator.events();
        t.core.initialize();

        t.core.resource_manager().store(
            "blob",
            json!("0123456789"),
            ResourceType::Data,
            Some("video"),
        );

        let alert = timeout(Duration::from_secs(1), async {
            loop {
                match events.recv().await {
                    Ok(IntegratorEvent::PerformanceAlert { message, severity }) => {
                        return (message, severity)
                    }
                    Ok(_) => continue,
                    Err(e) => panic!("integrator events closed: {e}"),
                }
            }
        })
        .await
        .expect("alert raised");

        assert!(alert.0.starts_with("Memory usage"));
        assert_eq!(alert.1, severity::WARNING);
        t.core.shutdown();
    }

    #[test]
    fn test_memory_pressure_triggers_auto_optimization() {
        let mut config = CoreConfig::default();
        config.integrator.memory_threshold_bytes = 12;
        let t = test_core(config, ScriptedLoader::new());
        let resources = t.core.resource_manager();
        resources.store("blob", json!("0123456789"), ResourceType::Data, None);

        let integrator = t.core.performance_integrator();
        let metrics = integrator.update_performance_metrics();
        assert!(metrics.memory_ratio() > 0.9);
        assert_eq!(
            integrator.recommendations()[0].category,
            OptimizationCategory::Memory
        );

        let mut events = integrator.events();
        assert!(integrator.perform_periodic_optimization());
        let mut triggered = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let IntegratorEvent::AutoOptimizationTriggered(issue) = event {
                triggered.push(issue);
            }
        }
        assert_eq!(triggered, vec!["High memory usage detected".to_string()]);
    }

    #[test]
    fn test_metrics_tick_is_exported() {
        module_telemetry::register_metrics().expect("metrics registered");
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        t.core.performance_integrator().update_performance_metrics();

        let exposition = module_telemetry::encode_metrics().expect("metrics encoded");
        assert!(exposition.contains("mc_performance_score"));
        assert!(exposition.contains("mc_bus_queue_depth"));
    }

    #[test]
    fn test_shared_object_visible_across_modules() {
        let t = test_core(CoreConfig::default(), ScriptedLoader::new());
        let resources = t.core.resource_manager();

        let renderer = Arc::new(String::from("gl-context"));
        assert!(resources.set_shared_object("renderer", &renderer));
        let seen: Option<Arc<String>> = resources.get_shared_object("renderer");
        assert_eq!(seen.as_deref().map(String::as_str), Some("gl-context"));

        drop(seen);
        drop(renderer);
        assert!(!resources.is_shared_object_alive("renderer"));
        assert!(resources.get_shared_object::<String>("renderer").is_none());
    }
}
