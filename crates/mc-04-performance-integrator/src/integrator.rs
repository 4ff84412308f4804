//! # Performance Integrator
//!
//! Reads the bus, resource manager and startup optimizer through their public
//! accessors, scores overall health and writes tuning back.
//!
//! ## Timers
//!
//! | Timer | Default | Work |
//! |-------|---------|------|
//! | metrics | 30 s | [`PerformanceIntegrator::update_performance_metrics`] |
//! | optimization | 5 min | [`PerformanceIntegrator::perform_periodic_optimization`] |
//!
//! Two listener tasks forward bus performance alerts and resource memory
//! warnings into [`PerformanceIntegrator::handle_bus_event`] and
//! [`PerformanceIntegrator::handle_resource_event`].

use crate::config::IntegratorConfig;
use crate::events::{severity, IntegratorEvent, OptimizationScope};
use crate::metrics::SystemPerformanceMetrics;
use crate::recommendations::{
    generate_recommendations, OptimizationAction, OptimizationCategory,
    OptimizationRecommendation,
};
use crate::score::performance_score;
use mc_01_communication_bus::{BusEvent, CommunicationBus};
use mc_02_resource_manager::{ResourceEvent, ResourceManager};
use mc_03_startup_optimizer::StartupOptimizer;
use module_telemetry::{
    metric_inc, metric_set, BUS_LATENCY_MS, BUS_MESSAGES_DROPPED, BUS_MESSAGES_PROCESSED,
    BUS_QUEUE_DEPTH, CACHE_HIT_RATIO, MEMORY_USAGE_BYTES, MODULES_LOADED,
    OPTIMIZATIONS_APPLIED, PERFORMANCE_SCORE,
};
use parking_lot::{Mutex, RwLock};
use shared_types::{abort_all, spawn_periodic, SharedClock, SystemClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const MIB: u64 = 1024 * 1024;

/// Periodic optimization runs below this score.
const AUTO_OPTIMIZE_SCORE: u32 = 70;
/// Alert thresholds on the score.
const POOR_SCORE: u32 = 50;
const ATTENTION_SCORE: u32 = 70;
/// Periodic optimization runs above this share of the memory threshold.
const AUTO_OPTIMIZE_MEMORY_RATIO: f64 = 0.9;
const HIGH_LATENCY_MS: f64 = 1_000.0;
const LOW_LATENCY_MS: f64 = 100.0;

const HIGH_LATENCY_BATCH_SIZE: usize = 50;
const LOW_LATENCY_BATCH_SIZE: usize = 200;
const BACKLOG_QUEUE_SIZE: usize = 1_000;
const BACKLOG_PROCESSING_INTERVAL_MS: u64 = 5;

const LOW_HIT_RATIO: f64 = 0.7;
const CACHE_GROWTH_FACTOR: f64 = 1.5;

const TUNED_PARALLEL_LOADS: usize = 6;
const TUNED_PRELOAD_DELAY_MS: u64 = 500;

#[derive(Default)]
struct IntegratorState {
    metrics: SystemPerformanceMetrics,
    recommendations: Vec<OptimizationRecommendation>,
}

struct IntegratorInner {
    bus: CommunicationBus,
    resources: ResourceManager,
    optimizer: StartupOptimizer,
    config: RwLock<IntegratorConfig>,
    state: Mutex<IntegratorState>,
    auto_optimization: AtomicBool,
    optimization_active: AtomicBool,
    optimization_paused: AtomicBool,
    initialized: AtomicBool,
    metrics_timer: Mutex<Option<JoinHandle<()>>>,
    optimization_timer: Mutex<Option<JoinHandle<()>>>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
    events: broadcast::Sender<IntegratorEvent>,
    clock: SharedClock,
}

/// Health scoring and runtime tuning over the three core components.
///
/// Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct PerformanceIntegrator {
    inner: Arc<IntegratorInner>,
}

impl PerformanceIntegrator {
    pub fn new(
        bus: CommunicationBus,
        resources: ResourceManager,
        optimizer: StartupOptimizer,
        config: IntegratorConfig,
    ) -> Self {
        Self::with_clock(bus, resources, optimizer, config, SystemClock::shared())
    }

    pub fn with_clock(
        bus: CommunicationBus,
        resources: ResourceManager,
        optimizer: StartupOptimizer,
        config: IntegratorConfig,
        clock: SharedClock,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let state = IntegratorState {
            metrics: SystemPerformanceMetrics {
                memory_threshold: config.memory_threshold_bytes,
                ..SystemPerformanceMetrics::default()
            },
            recommendations: Vec::new(),
        };

        Self {
            inner: Arc::new(IntegratorInner {
                bus,
                resources,
                optimizer,
                auto_optimization: AtomicBool::new(config.auto_optimization),
                config: RwLock::new(config),
                state: Mutex::new(state),
                optimization_active: AtomicBool::new(false),
                optimization_paused: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                metrics_timer: Mutex::new(None),
                optimization_timer: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
                events,
                clock,
            }),
        }
    }

    fn emit(&self, event: IntegratorEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Listen to integrator events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<IntegratorEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn communication_bus(&self) -> &CommunicationBus {
        &self.inner.bus
    }

    #[must_use]
    pub fn resource_manager(&self) -> &ResourceManager {
        &self.inner.resources
    }

    #[must_use]
    pub fn startup_optimizer(&self) -> &StartupOptimizer {
        &self.inner.optimizer
    }

    #[must_use]
    pub fn config(&self) -> IntegratorConfig {
        self.inner.config.read().clone()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the three components, the metrics timer and the event
    /// listeners. Starts periodic optimization when auto optimization is on.
    ///
    /// Does nothing outside a tokio runtime, so a later call can still
    /// initialize.
    pub fn initialize(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, integrator not initialized");
            return;
        };
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        self.inner.bus.start();
        self.inner.resources.start();
        self.inner.optimizer.start();

        self.spawn_listeners(&runtime);
        let period = self.inner.config.read().metrics_interval_ms;
        let handle = spawn_periodic(&runtime, Arc::downgrade(&self.inner), period, |inner| {
            PerformanceIntegrator { inner }.update_performance_metrics();
        });
        *self.inner.metrics_timer.lock() = Some(handle);

        if self.is_auto_optimization_enabled() {
            self.start_optimization();
        }
        info!("Performance integrator initialized");
    }

    /// Stop every timer and listener, then the three components.
    pub fn shutdown(&self) {
        if !self.inner.initialized.swap(false, Ordering::SeqCst) {
            return;
        }

        self.stop_optimization();
        let mut handles: Vec<JoinHandle<()>> = self.inner.listeners.lock().drain(..).collect();
        handles.extend(self.inner.metrics_timer.lock().take());
        abort_all(handles);

        self.inner.bus.stop();
        self.inner.resources.stop();
        self.inner.optimizer.stop();
        info!("Performance integrator shut down");
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    fn spawn_listeners(&self, runtime: &Handle) {
        let weak = Arc::downgrade(&self.inner);
        let bus = spawn_listener(runtime, self.inner.bus.events(), weak.clone(), |this, event| {
            this.handle_bus_event(&event);
        });
        let resources = spawn_listener(runtime, self.inner.resources.events(), weak, |this, event| {
            this.handle_resource_event(&event);
        });
        self.inner.listeners.lock().extend([bus, resources]);
    }

    // =========================================================================
    // OPTIMIZATION CONTROL
    // =========================================================================

    pub fn start_optimization(&self) {
        self.inner.optimization_active.store(true, Ordering::SeqCst);
        self.inner.optimization_paused.store(false, Ordering::SeqCst);
        if self.is_auto_optimization_enabled() {
            self.ensure_optimization_timer();
        }
        info!("Performance optimization started");
    }

    pub fn stop_optimization(&self) {
        self.inner.optimization_active.store(false, Ordering::SeqCst);
        self.abort_optimization_timer();
        info!("Performance optimization stopped");
    }

    pub fn pause_optimization(&self) {
        self.inner.optimization_paused.store(true, Ordering::SeqCst);
        info!("Performance optimization paused");
    }

    pub fn resume_optimization(&self) {
        self.inner.optimization_paused.store(false, Ordering::SeqCst);
        info!("Performance optimization resumed");
    }

    #[must_use]
    pub fn is_optimization_active(&self) -> bool {
        self.inner.optimization_active.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_optimization_paused(&self) -> bool {
        self.inner.optimization_paused.load(Ordering::SeqCst)
    }

    /// Toggle automatic optimization. The optimization timer only runs while
    /// optimization is both active and automatic.
    pub fn enable_auto_optimization(&self, enabled: bool) {
        self.inner.auto_optimization.store(enabled, Ordering::SeqCst);
        self.inner.config.write().auto_optimization = enabled;
        if enabled && self.is_optimization_active() {
            self.ensure_optimization_timer();
        } else {
            self.abort_optimization_timer();
        }
        info!(enabled, "Auto optimization toggled");
    }

    #[must_use]
    pub fn is_auto_optimization_enabled(&self) -> bool {
        self.inner.auto_optimization.load(Ordering::SeqCst)
    }

    /// Change the optimization period, restarting a running timer.
    pub fn set_optimization_interval(&self, interval_ms: u64) {
        self.inner.config.write().optimization_interval_ms = interval_ms;
        let was_running = self.abort_optimization_timer();
        if was_running {
            self.ensure_optimization_timer();
        }
        info!(interval_ms, "Optimization interval set");
    }

    pub fn set_memory_threshold(&self, bytes: u64) {
        self.inner.config.write().memory_threshold_bytes = bytes;
        debug!(bytes, "Memory threshold set");
    }

    fn ensure_optimization_timer(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, optimization timer not started");
            return;
        };
        let period = self.inner.config.read().optimization_interval_ms;
        let mut timer = self.inner.optimization_timer.lock();
        if timer.is_none() {
            *timer = Some(spawn_periodic(
                &runtime,
                Arc::downgrade(&self.inner),
                period,
                |inner| {
                    PerformanceIntegrator { inner }.perform_periodic_optimization();
                },
            ));
        }
    }

    fn abort_optimization_timer(&self) -> bool {
        let handle = self.inner.optimization_timer.lock().take();
        let was_running = handle.is_some();
        abort_all(handle);
        was_running
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Latest snapshot.
    #[must_use]
    pub fn system_metrics(&self) -> SystemPerformanceMetrics {
        self.inner.state.lock().metrics.clone()
    }

    /// Recommendations from the latest snapshot.
    #[must_use]
    pub fn recommendations(&self) -> Vec<OptimizationRecommendation> {
        self.inner.state.lock().recommendations.clone()
    }

    #[must_use]
    pub fn calculate_performance_score(&self, metrics: &SystemPerformanceMetrics) -> u32 {
        performance_score(&metrics.score_inputs())
    }

    /// Take a fresh snapshot, publish it, raise threshold alerts and
    /// regenerate recommendations.
    pub fn update_performance_metrics(&self) -> SystemPerformanceMetrics {
        let communication = self.inner.bus.performance_metrics();
        let cache = self.inner.resources.cache_statistics();
        let startup = self.inner.optimizer.startup_metrics();
        let threshold = self.inner.config.read().memory_threshold_bytes;
        let previous_peak = self.inner.state.lock().metrics.peak_memory_usage;

        let metrics = SystemPerformanceMetrics::collect(
            communication,
            cache,
            startup,
            threshold,
            previous_peak,
            self.inner.clock.now_ms(),
        );
        self.inner.state.lock().metrics = metrics.clone();

        publish_gauges(&metrics);
        debug!(
            score = metrics.performance_score,
            level = %metrics.performance_level,
            memory = metrics.total_memory_usage,
            latency_ms = metrics.communication.average_latency_ms,
            "Performance metrics updated"
        );
        self.emit(IntegratorEvent::PerformanceMetricsUpdated(Box::new(
            metrics.clone(),
        )));

        self.check_performance_thresholds(&metrics);
        self.generate_optimization_recommendations(&metrics);
        metrics
    }

    fn check_performance_thresholds(&self, metrics: &SystemPerformanceMetrics) {
        if metrics.memory_threshold > 0 && metrics.total_memory_usage > metrics.memory_threshold {
            self.alert("Memory threshold exceeded".into(), severity::CRITICAL);
        }

        if metrics.performance_score < POOR_SCORE {
            self.alert("System performance is poor".into(), severity::CRITICAL);
        } else if metrics.performance_score < ATTENTION_SCORE {
            self.alert("System performance needs attention".into(), severity::NOTICE);
        }
    }

    fn generate_optimization_recommendations(
        &self,
        metrics: &SystemPerformanceMetrics,
    ) -> Vec<OptimizationRecommendation> {
        let recommendations = generate_recommendations(metrics);
        self.inner.state.lock().recommendations = recommendations.clone();

        for recommendation in &recommendations {
            debug!(
                category = %recommendation.category,
                priority = recommendation.priority,
                issue = %recommendation.issue,
                "Optimization recommended"
            );
            self.emit(IntegratorEvent::OptimizationRecommendationAvailable(
                recommendation.clone(),
            ));
        }
        recommendations
    }

    fn alert(&self, message: String, severity: u8) {
        warn!(severity, message = %message, "Performance alert");
        self.emit(IntegratorEvent::PerformanceAlert { message, severity });
    }

    // =========================================================================
    // AUTOMATIC OPTIMIZATION
    // =========================================================================

    /// Apply high-priority recommendations when the latest snapshot calls
    /// for it. Returns whether anything was attempted.
    pub fn perform_periodic_optimization(&self) -> bool {
        if self.is_optimization_paused() || !self.is_auto_optimization_enabled() {
            return false;
        }
        if !self.should_trigger_auto_optimization() {
            return false;
        }
        let applied = self.execute_auto_optimization();
        info!(applied, "Periodic optimization ran");
        true
    }

    /// Whether the latest snapshot is bad enough for automatic tuning.
    #[must_use]
    pub fn should_trigger_auto_optimization(&self) -> bool {
        let metrics = self.system_metrics();
        metrics.performance_score < AUTO_OPTIMIZE_SCORE
            || metrics.memory_ratio() > AUTO_OPTIMIZE_MEMORY_RATIO
            || metrics.communication.average_latency_ms > HIGH_LATENCY_MS
    }

    /// Run the action of every auto-applicable recommendation of priority 3
    /// or higher. Returns how many ran.
    pub fn execute_auto_optimization(&self) -> usize {
        let mut applied = 0;
        for recommendation in self.recommendations() {
            if !recommendation.should_auto_apply() {
                continue;
            }
            self.apply(recommendation.action);
            self.emit(IntegratorEvent::AutoOptimizationTriggered(recommendation.issue));
            applied += 1;
        }
        applied
    }

    fn apply(&self, action: OptimizationAction) {
        match action {
            OptimizationAction::OptimizeMemory => self.optimize_memory_usage(),
            OptimizationAction::OptimizeCommunication => self.optimize_communication(),
            OptimizationAction::OptimizeResources => self.optimize_resource_usage(),
            OptimizationAction::OptimizeStartup => self.optimize_startup_performance(),
        }
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Compact resource memory and free idle temporaries.
    pub fn optimize_memory_usage(&self) {
        let compacted = self.inner.resources.compact_memory();
        let freed = self.inner.resources.free_unused_resources();
        self.complete(
            OptimizationAction::OptimizeMemory,
            OptimizationCategory::Memory,
            format!("Memory optimization completed: {compacted} compacted, {freed} freed"),
        );
    }

    /// Retune the bus from its live latency and backlog.
    pub fn optimize_communication(&self) {
        let metrics = self.inner.bus.performance_metrics();
        if metrics.average_latency_ms > HIGH_LATENCY_MS {
            self.inner.bus.set_batch_size(HIGH_LATENCY_BATCH_SIZE);
        } else if metrics.average_latency_ms < LOW_LATENCY_MS {
            self.inner.bus.set_batch_size(LOW_LATENCY_BATCH_SIZE);
        }
        if metrics.queue_size > BACKLOG_QUEUE_SIZE {
            self.inner
                .bus
                .set_processing_interval(BACKLOG_PROCESSING_INTERVAL_MS);
        }
        self.complete(
            OptimizationAction::OptimizeCommunication,
            OptimizationCategory::Communication,
            "Communication optimization completed".into(),
        );
    }

    /// Sweep the cache, growing it when the live hit ratio is low.
    pub fn optimize_resource_usage(&self) {
        let evicted = self.inner.resources.optimize_cache();
        let stats = self.inner.resources.cache_statistics();
        if stats.accesses() > 0 && stats.hit_ratio < LOW_HIT_RATIO {
            let grown = (stats.max_size as f64 * CACHE_GROWTH_FACTOR) as u64;
            self.inner.resources.set_cache_max_size(grown);
            debug!(from = stats.max_size, to = grown, "Cache grown");
        }
        self.complete(
            OptimizationAction::OptimizeResources,
            OptimizationCategory::Cache,
            format!("Resource optimization completed: {evicted} evicted"),
        );
    }

    /// Widen parallel loading, enable preloading and refresh load estimates.
    pub fn optimize_startup_performance(&self) {
        let optimizer = &self.inner.optimizer;
        optimizer.enable_parallel_loading(true, TUNED_PARALLEL_LOADS);
        optimizer.enable_preloading(true, TUNED_PRELOAD_DELAY_MS);
        let summary = optimizer.optimize_for_next_startup();
        self.complete(
            OptimizationAction::OptimizeStartup,
            OptimizationCategory::Startup,
            format!("Startup optimization completed: {summary}"),
        );
    }

    /// Run all four actions.
    pub fn perform_full_optimization(&self) {
        self.optimize_memory_usage();
        self.optimize_communication();
        self.optimize_startup_performance();
        self.optimize_resource_usage();

        let summary = "Full system optimization completed".to_string();
        info!("{}", summary);
        self.emit(IntegratorEvent::OptimizationCompleted {
            scope: OptimizationScope::Full,
            summary,
        });
    }

    fn complete(&self, action: OptimizationAction, category: OptimizationCategory, summary: String) {
        metric_inc!(OPTIMIZATIONS_APPLIED, &[action.label()]);
        info!(category = %category, "{}", summary);
        self.emit(IntegratorEvent::OptimizationCompleted {
            scope: OptimizationScope::Category(category),
            summary,
        });
    }

    // =========================================================================
    // COMPONENT EVENTS
    // =========================================================================

    /// React to a bus notification. Only performance alerts matter.
    pub fn handle_bus_event(&self, event: &BusEvent) {
        let BusEvent::PerformanceAlert(message) = event else {
            return;
        };
        self.alert(format!("Communication: {message}"), severity::NOTICE);
        if self.is_auto_optimization_enabled() {
            self.optimize_communication();
        }
    }

    /// React to a resource notification. Only memory warnings matter.
    pub fn handle_resource_event(&self, event: &ResourceEvent) {
        let ResourceEvent::MemoryWarning { current, max } = event else {
            return;
        };
        self.alert(
            format!("Memory usage: {}/{} MB", current / MIB, max / MIB),
            severity::WARNING,
        );
        if self.is_auto_optimization_enabled() {
            self.optimize_memory_usage();
        }
    }
}

impl std::fmt::Debug for PerformanceIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PerformanceIntegrator")
            .field("score", &state.metrics.performance_score)
            .field("recommendations", &state.recommendations.len())
            .field("auto_optimization", &self.is_auto_optimization_enabled())
            .finish()
    }
}

/// Forward events from a component channel until the channel closes or the
/// integrator is dropped.
fn spawn_listener<E>(
    runtime: &Handle,
    mut events: broadcast::Receiver<E>,
    target: Weak<IntegratorInner>,
    handle: fn(&PerformanceIntegrator, E),
) -> JoinHandle<()>
where
    E: Clone + Send + 'static,
{
    runtime.spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Some(inner) = target.upgrade() else {
                        break;
                    };
                    handle(&PerformanceIntegrator { inner }, event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Integrator listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn publish_gauges(metrics: &SystemPerformanceMetrics) {
    metric_set!(PERFORMANCE_SCORE, f64::from(metrics.performance_score));
    metric_set!(BUS_QUEUE_DEPTH, metrics.communication.queue_size as f64);
    metric_set!(BUS_LATENCY_MS, metrics.communication.average_latency_ms);
    metric_set!(
        BUS_MESSAGES_PROCESSED,
        metrics.communication.processed_messages as f64
    );
    metric_set!(
        BUS_MESSAGES_DROPPED,
        metrics.communication.dropped_messages as f64
    );
    metric_set!(CACHE_HIT_RATIO, metrics.effective_hit_ratio());
    metric_set!(MEMORY_USAGE_BYTES, metrics.total_memory_usage as f64);
    metric_set!(MODULES_LOADED, metrics.startup.loaded_modules as f64);
}
