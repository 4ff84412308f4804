//! # Startup Optimizer
//!
//! Plans module loads into dependency-ordered batches and runs them through
//! the shared worker pool, one batch at a time. Also owns the preload and
//! lazy-load queues and the load-time history that feeds the next startup.
//!
//! ## Session Flow
//!
//! ```text
//! modules ──priority sort──→ batches ──┬─→ [batch 1: a, b] ──barrier──┐
//!                                      │                              │
//!                           pause/stop checked between batches ←──────┘
//! ```

use crate::algorithms::{self, CycleHandling, ModuleRegistry};
use crate::config::{OptimizerConfig, MAX_ADAPTIVE_PARALLEL_LOADS, MIN_ADAPTIVE_PARALLEL_LOADS};
use crate::domain::{
    LoadSession, LoadStrategy, ModuleLoadError, ModuleLoadInfo, OptimizationLevel,
    OptimizerError, PerformanceProfile, SessionState, StartupMetrics,
};
use crate::events::{OptimizerEvent, LAZY_SESSION, PRELOAD_SESSION};
use crate::ports::ModuleLoader;
use crate::queues::ScheduleQueue;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use shared_types::{abort_all, spawn_periodic, CoreServices, Timestamp};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Average load time above which adaptive tuning adds parallelism
const SLOW_LOAD_MS: f64 = 5000.0;
/// Average load time below which adaptive tuning removes parallelism
const FAST_LOAD_MS: f64 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionControl {
    Run,
    Pause,
    Stop,
}

struct SessionSlot {
    session: LoadSession,
    control: watch::Sender<SessionControl>,
}

#[derive(Debug, Clone, Copy)]
struct LoadedModule {
    load_time_ms: u64,
    memory_usage_bytes: u64,
}

#[derive(Default)]
struct LoadRecords {
    metrics: StartupMetrics,
    load_times: HashMap<String, u64>,
    memory_usage: HashMap<String, u64>,
    /// Recent load times per module, oldest first
    history: HashMap<String, VecDeque<u64>>,
}

struct OptimizerInner {
    config: RwLock<OptimizerConfig>,
    modules: RwLock<ModuleRegistry>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    preload: Mutex<ScheduleQueue>,
    lazy: Mutex<ScheduleQueue>,
    records: Mutex<LoadRecords>,
    loader: Arc<dyn ModuleLoader>,
    events: broadcast::Sender<OptimizerEvent>,
    running: AtomicBool,
    timers: Mutex<Vec<JoinHandle<()>>>,
    services: CoreServices,
}

#[derive(Clone)]
pub struct StartupOptimizer {
    inner: Arc<OptimizerInner>,
}

impl StartupOptimizer {
    #[must_use]
    pub fn new(config: OptimizerConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        Self::with_services(config, loader, CoreServices::default())
    }

    #[must_use]
    pub fn with_services(
        config: OptimizerConfig,
        loader: Arc<dyn ModuleLoader>,
        services: CoreServices,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            inner: Arc::new(OptimizerInner {
                config: RwLock::new(config),
                modules: RwLock::new(ModuleRegistry::new()),
                sessions: RwLock::new(HashMap::new()),
                preload: Mutex::new(ScheduleQueue::new()),
                lazy: Mutex::new(ScheduleQueue::new()),
                records: Mutex::new(LoadRecords::default()),
                loader,
                events,
                running: AtomicBool::new(false),
                timers: Mutex::new(Vec::new()),
                services,
            }),
        }
    }

    fn now(&self) -> Timestamp {
        self.inner.services.clock.now_ms()
    }

    fn emit(&self, event: OptimizerEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Listen to optimizer events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<OptimizerEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> OptimizerConfig {
        self.inner.config.read().clone()
    }

    // =========================================================================
    // MODULE CONFIGURATION
    // =========================================================================

    pub fn set_module_load_info(&self, module: &str, mut info: ModuleLoadInfo) {
        info.module_name = module.to_string();
        self.inner.modules.write().insert(module.to_string(), info);
        debug!(module = module, "Module load info set");
    }

    /// Registered info, or defaults when the module is unknown.
    #[must_use]
    pub fn module_load_info(&self, module: &str) -> ModuleLoadInfo {
        self.inner
            .modules
            .read()
            .get(module)
            .cloned()
            .unwrap_or_else(|| ModuleLoadInfo::new(module))
    }

    fn update_module(&self, module: &str, update: impl FnOnce(&mut ModuleLoadInfo)) {
        let mut modules = self.inner.modules.write();
        let info = modules
            .entry(module.to_string())
            .or_insert_with(|| ModuleLoadInfo::new(module));
        update(info);
    }

    pub fn set_module_load_strategy(&self, module: &str, strategy: LoadStrategy) {
        self.update_module(module, |info| info.strategy = strategy);
        debug!(module = module, strategy = ?strategy, "Load strategy set");
    }

    pub fn set_module_priority(&self, module: &str, priority: i32) {
        self.update_module(module, |info| info.priority = priority);
        debug!(module = module, priority, "Priority set");
    }

    pub fn set_module_dependencies(&self, module: &str, dependencies: Vec<String>) {
        debug!(module = module, dependencies = ?dependencies, "Dependencies set");
        self.update_module(module, |info| info.dependencies = dependencies);
    }

    /// Names of all registered modules, sorted.
    #[must_use]
    pub fn registered_modules(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.modules.read().keys().cloned().collect();
        names.sort();
        names
    }

    // =========================================================================
    // TUNING
    // =========================================================================

    pub fn enable_parallel_loading(&self, enabled: bool, max_parallel: usize) {
        let mut config = self.inner.config.write();
        config.parallel_loading = enabled;
        config.max_parallel_loads = max_parallel.max(1);
        info!(enabled, max_parallel = config.max_parallel_loads, "Parallel loading");
    }

    pub fn enable_lazy_loading(&self, enabled: bool, timeout_ms: u64) {
        let mut config = self.inner.config.write();
        config.lazy_loading = enabled;
        config.lazy_load_timeout_ms = timeout_ms;
        info!(enabled, timeout_ms, "Lazy loading");
    }

    pub fn enable_preloading(&self, enabled: bool, delay_ms: u64) {
        let mut config = self.inner.config.write();
        config.preloading = enabled;
        config.preload_delay_ms = delay_ms;
        info!(enabled, delay_ms, "Preloading");
    }

    pub fn set_strict_dependencies(&self, strict: bool) {
        self.inner.config.write().strict_dependencies = strict;
    }

    pub fn set_module_load_timeout(&self, timeout_ms: u64) {
        self.inner.config.write().module_load_timeout_ms = timeout_ms.max(1);
    }

    /// Apply a preset. `Adaptive` re-tunes parallelism from measured loads.
    pub fn set_optimization_level(&self, level: OptimizationLevel) {
        {
            let mut config = self.inner.config.write();
            config.optimization_level = level;
            match level {
                OptimizationLevel::None => {
                    config.parallel_loading = false;
                    config.lazy_loading = false;
                    config.preloading = false;
                }
                OptimizationLevel::Basic => {
                    config.parallel_loading = true;
                    config.max_parallel_loads = 2;
                }
                OptimizationLevel::Aggressive => {
                    config.parallel_loading = true;
                    config.max_parallel_loads = MAX_ADAPTIVE_PARALLEL_LOADS;
                    config.preloading = true;
                }
                OptimizationLevel::Adaptive => {}
            }
        }
        if level == OptimizationLevel::Adaptive {
            self.analyze_load_performance();
        }
        info!(level = ?level, "Optimization level set");
    }

    #[must_use]
    pub fn optimization_level(&self) -> OptimizationLevel {
        self.inner.config.read().optimization_level
    }

    /// Adopt a profile's settings and merge its module configurations.
    pub fn set_performance_profile(&self, profile: PerformanceProfile) {
        {
            let mut config = self.inner.config.write();
            config.profile_name = profile.profile_name.clone();
            config.optimization_level = profile.optimization_level;
            config.max_parallel_loads = profile.max_parallel_loads.max(1);
            config.preload_delay_ms = profile.preload_delay_ms;
            config.lazy_load_timeout_ms = profile.lazy_load_timeout_ms;
        }
        let count = profile.module_configs.len();
        self.inner.modules.write().extend(profile.module_configs);
        info!(profile = %profile.profile_name, modules = count, "Performance profile set");
    }

    #[must_use]
    pub fn performance_profile(&self) -> PerformanceProfile {
        let config = self.config();
        PerformanceProfile {
            profile_name: config.profile_name,
            optimization_level: config.optimization_level,
            max_parallel_loads: config.max_parallel_loads,
            preload_delay_ms: config.preload_delay_ms,
            lazy_load_timeout_ms: config.lazy_load_timeout_ms,
            module_configs: self.inner.modules.read().clone(),
        }
    }

    // =========================================================================
    // PLANNING
    // =========================================================================

    /// Stable sort by descending priority.
    #[must_use]
    pub fn optimize_load_order(&self, modules: &[String]) -> Vec<String> {
        algorithms::optimize_load_order(modules, &self.inner.modules.read())
    }

    /// Batches for `modules` at the current parallelism. Cycles are broken by
    /// forcing a module.
    #[must_use]
    pub fn create_load_batches(&self, modules: &[String]) -> Vec<Vec<String>> {
        let width = self.inner.config.read().batch_width();
        let registry = self.inner.modules.read();
        algorithms::create_load_batches(modules, &registry, width, CycleHandling::ForceFirst)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn validate_dependencies(&self, modules: &[String]) -> bool {
        self.try_validate_dependencies(modules).is_ok()
    }

    pub fn try_validate_dependencies(&self, modules: &[String]) -> Result<(), OptimizerError> {
        algorithms::validate_dependencies(modules, &self.inner.modules.read())
    }

    /// Everything `module` needs, dependencies first, ending with `module`.
    #[must_use]
    pub fn resolve_dependencies(&self, module: &str) -> Vec<String> {
        algorithms::resolve_dependencies(module, &self.inner.modules.read())
    }

    // =========================================================================
    // LOAD SESSIONS
    // =========================================================================

    fn open_session(&self, modules: Vec<String>) -> (String, watch::Receiver<SessionControl>) {
        let session_id = Uuid::new_v4().to_string();
        let (control, receiver) = watch::channel(SessionControl::Run);
        let session = LoadSession {
            session_id: session_id.clone(),
            modules_to_load: modules,
            state: SessionState::Running,
            start_time_ms: self.now(),
            ..LoadSession::default()
        };
        self.inner
            .sessions
            .write()
            .insert(session_id.clone(), SessionSlot { session, control });
        (session_id, receiver)
    }

    /// Start loading `modules` in the background. Returns the session id.
    pub fn start_load_session(&self, modules: Vec<String>) -> String {
        let (session_id, control) = self.open_session(modules);
        match Handle::try_current() {
            Ok(runtime) => {
                let optimizer = self.clone();
                let id = session_id.clone();
                runtime.spawn(async move {
                    optimizer.drive_session(id, control).await;
                });
            }
            Err(_) => {
                warn!(session_id = %session_id, "No tokio runtime, load session not started");
                self.fail_session(&session_id, "no async runtime".to_string());
            }
        }
        session_id
    }

    /// Load `modules` and wait for the session to finish.
    pub async fn run_load_session(&self, modules: Vec<String>) -> LoadSession {
        let (session_id, control) = self.open_session(modules);
        self.drive_session(session_id, control).await
    }

    async fn drive_session(
        &self,
        session_id: String,
        mut control: watch::Receiver<SessionControl>,
    ) -> LoadSession {
        let modules = self
            .inner
            .sessions
            .read()
            .get(&session_id)
            .map(|slot| slot.session.modules_to_load.clone())
            .unwrap_or_default();

        info!(session_id = %session_id, modules = modules.len(), "Load session started");
        self.emit(OptimizerEvent::LoadSessionStarted {
            session_id: session_id.clone(),
            modules: modules.clone(),
        });

        let (width, cycles) = {
            let config = self.inner.config.read();
            let cycles = if config.strict_dependencies {
                CycleHandling::Reject
            } else {
                CycleHandling::ForceFirst
            };
            (config.batch_width(), cycles)
        };
        let planned = {
            let registry = self.inner.modules.read();
            let order = algorithms::optimize_load_order(&modules, &registry);
            algorithms::create_load_batches(&order, &registry, width, cycles)
        };
        let batches = match planned {
            Ok(batches) => batches,
            Err(err) => return self.fail_session(&session_id, err.to_string()),
        };

        {
            let mut sessions = self.inner.sessions.write();
            if let Some(slot) = sessions.get_mut(&session_id) {
                slot.session.batches = batches.clone();
            }
        }

        for (index, batch) in batches.iter().enumerate() {
            if !Self::wait_until_runnable(&mut control).await {
                info!(session_id = %session_id, batch = index, "Load session stopped");
                break;
            }
            debug!(session_id = %session_id, batch = index, modules = ?batch, "Loading batch");
            self.load_batch(&session_id, batch).await;
        }

        self.finish_session(&session_id)
    }

    /// Blocks while paused. Returns false once the session is stopped.
    async fn wait_until_runnable(control: &mut watch::Receiver<SessionControl>) -> bool {
        loop {
            let state = *control.borrow_and_update();
            match state {
                SessionControl::Run => return true,
                SessionControl::Stop => return false,
                SessionControl::Pause => {
                    if control.changed().await.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    async fn load_batch(&self, session_id: &str, batch: &[String]) {
        let handles: Vec<JoinHandle<Result<LoadedModule, ModuleLoadError>>> = batch
            .iter()
            .map(|module| {
                let optimizer = self.clone();
                let module = module.clone();
                let session_id = session_id.to_string();
                self.inner
                    .services
                    .worker_pool
                    .spawn(async move { optimizer.load_one(&module, &session_id).await })
            })
            .collect();

        let parallel = batch.len() > 1;
        for (module, joined) in batch.iter().zip(join_all(handles).await) {
            let outcome = joined.unwrap_or_else(|err| {
                Err(ModuleLoadError::Failed {
                    module: module.clone(),
                    reason: err.to_string(),
                })
            });
            self.record_session_outcome(session_id, module, outcome, parallel);
        }
    }

    async fn load_one(&self, module: &str, session_id: &str) -> Result<LoadedModule, ModuleLoadError> {
        let timeout_ms = self.inner.config.read().module_load_timeout_ms;
        self.emit(OptimizerEvent::ModuleLoadStarted {
            module: module.to_string(),
            session_id: session_id.to_string(),
        });

        let started = self.now();
        let result = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.inner.loader.load_module(module),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ModuleLoadError::TimedOut {
                module: module.to_string(),
                timeout_ms,
            }),
        };
        let load_time_ms = self.now().saturating_sub(started);

        match result {
            Ok(report) => {
                self.record_load(module, load_time_ms, report.memory_usage_bytes);
                debug!(module = module, session_id = session_id, load_time_ms, "Module loaded");
                self.emit(OptimizerEvent::ModuleLoadCompleted {
                    module: module.to_string(),
                    session_id: session_id.to_string(),
                    load_time_ms,
                });
                Ok(LoadedModule {
                    load_time_ms,
                    memory_usage_bytes: report.memory_usage_bytes,
                })
            }
            Err(err) => {
                self.inner.records.lock().metrics.failed_modules += 1;
                warn!(module = module, session_id = session_id, error = %err, "Module load failed");
                self.emit(OptimizerEvent::ModuleLoadFailed {
                    module: module.to_string(),
                    session_id: session_id.to_string(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn record_load(&self, module: &str, load_time_ms: u64, memory_usage_bytes: u64) {
        let history_len = self.inner.config.read().load_history_len.max(1);
        let mut records = self.inner.records.lock();
        records.load_times.insert(module.to_string(), load_time_ms);
        records
            .memory_usage
            .insert(module.to_string(), memory_usage_bytes);

        let history = records.history.entry(module.to_string()).or_default();
        history.push_back(load_time_ms);
        while history.len() > history_len {
            history.pop_front();
        }

        let total_memory: u64 = records.memory_usage.values().sum();
        let metrics = &mut records.metrics;
        metrics.loaded_modules += 1;
        metrics.final_memory_usage = total_memory;
        metrics.peak_memory_usage = metrics.peak_memory_usage.max(total_memory);
    }

    fn record_session_outcome(
        &self,
        session_id: &str,
        module: &str,
        outcome: Result<LoadedModule, ModuleLoadError>,
        parallel: bool,
    ) {
        if parallel && outcome.is_ok() {
            self.inner.records.lock().metrics.parallel_load_count += 1;
        }

        let mut sessions = self.inner.sessions.write();
        let Some(slot) = sessions.get_mut(session_id) else {
            return;
        };
        let session = &mut slot.session;
        match outcome {
            Ok(loaded) => {
                session.success_count += 1;
                session
                    .module_load_times
                    .insert(module.to_string(), loaded.load_time_ms);
                session
                    .module_memory_usage
                    .insert(module.to_string(), loaded.memory_usage_bytes);
            }
            Err(err) => {
                session.failure_count += 1;
                session.error_message = Some(match session.error_message.take() {
                    Some(previous) => format!("{previous}; {err}"),
                    None => err.to_string(),
                });
            }
        }
    }

    fn finish_session(&self, session_id: &str) -> LoadSession {
        let now = self.now();
        let finished = {
            let mut sessions = self.inner.sessions.write();
            sessions.get_mut(session_id).map(|slot| {
                let session = &mut slot.session;
                session.end_time_ms = now;
                session.total_load_time_ms = now.saturating_sub(session.start_time_ms);
                if session.state != SessionState::Stopped {
                    session.state = if session.failure_count > 0 {
                        SessionState::Failed
                    } else {
                        SessionState::Completed
                    };
                }
                if session.failure_count > 0 {
                    let detail = session.error_message.take().unwrap_or_default();
                    session.error_message = Some(format!(
                        "{} of {} modules failed: {detail}",
                        session.failure_count,
                        session.failure_count + session.success_count
                    ));
                }
                session.clone()
            })
        };
        let Some(session) = finished else {
            return LoadSession::default();
        };

        self.inner.records.lock().metrics.total_startup_time_ms = session.total_load_time_ms;

        if session.state == SessionState::Failed {
            let error = session.error_message.clone().unwrap_or_default();
            warn!(session_id = session_id, error = %error, "Load session failed");
            self.emit(OptimizerEvent::LoadSessionFailed {
                session_id: session_id.to_string(),
                error,
            });
        } else {
            info!(
                session_id = session_id,
                state = ?session.state,
                loaded = session.success_count,
                total_load_time_ms = session.total_load_time_ms,
                "Load session finished"
            );
            self.emit(OptimizerEvent::LoadSessionCompleted(Box::new(session.clone())));
        }
        session
    }

    fn fail_session(&self, session_id: &str, error: String) -> LoadSession {
        let now = self.now();
        let failed = {
            let mut sessions = self.inner.sessions.write();
            sessions.get_mut(session_id).map(|slot| {
                let session = &mut slot.session;
                session.state = SessionState::Failed;
                session.end_time_ms = now;
                session.total_load_time_ms = now.saturating_sub(session.start_time_ms);
                session.error_message = Some(error.clone());
                session.clone()
            })
        };

        warn!(session_id = session_id, error = %error, "Load session failed");
        self.emit(OptimizerEvent::LoadSessionFailed {
            session_id: session_id.to_string(),
            error,
        });
        failed.unwrap_or_default()
    }

    fn transition(
        &self,
        session_id: &str,
        action: &'static str,
        from: &[SessionState],
        to: SessionState,
        control: SessionControl,
    ) -> Result<(), OptimizerError> {
        {
            let mut sessions = self.inner.sessions.write();
            let slot = sessions
                .get_mut(session_id)
                .ok_or_else(|| OptimizerError::SessionNotFound(session_id.to_string()))?;
            if !from.contains(&slot.session.state) {
                return Err(OptimizerError::InvalidSessionState {
                    session_id: session_id.to_string(),
                    action,
                    state: format!("{:?}", slot.session.state),
                });
            }
            slot.session.state = to;
            slot.control.send_replace(control);
        }
        info!(session_id = session_id, action = action, "Load session control");
        Ok(())
    }

    /// Hold the session before its next batch.
    pub fn pause_load_session(&self, session_id: &str) -> Result<(), OptimizerError> {
        self.transition(
            session_id,
            "pause",
            &[SessionState::Running],
            SessionState::Paused,
            SessionControl::Pause,
        )
    }

    pub fn resume_load_session(&self, session_id: &str) -> Result<(), OptimizerError> {
        self.transition(
            session_id,
            "resume",
            &[SessionState::Paused],
            SessionState::Running,
            SessionControl::Run,
        )
    }

    /// End the session before its next batch. Loads in flight still finish.
    pub fn stop_load_session(&self, session_id: &str) -> Result<(), OptimizerError> {
        self.transition(
            session_id,
            "stop",
            &[SessionState::Running, SessionState::Paused],
            SessionState::Stopped,
            SessionControl::Stop,
        )
    }

    #[must_use]
    pub fn load_session(&self, session_id: &str) -> Option<LoadSession> {
        self.inner
            .sessions
            .read()
            .get(session_id)
            .map(|slot| slot.session.clone())
    }

    // =========================================================================
    // PRELOAD & LAZY LOAD
    // =========================================================================

    /// Queue a preload `delay_ms` from now (0 = configured delay). Returns
    /// false while preloading is disabled.
    pub fn schedule_preload(&self, module: &str, delay_ms: u64) -> bool {
        let (enabled, default_delay) = {
            let config = self.inner.config.read();
            (config.preloading, config.preload_delay_ms)
        };
        if !enabled {
            debug!(module = module, "Preloading disabled, not scheduled");
            return false;
        }

        let delay_ms = if delay_ms > 0 { delay_ms } else { default_delay };
        let due = self.now() + delay_ms;
        self.inner.preload.lock().schedule(module, due);
        debug!(module = module, delay_ms, "Preload scheduled");
        self.emit(OptimizerEvent::PreloadScheduled {
            module: module.to_string(),
            delay_ms,
        });
        true
    }

    pub fn cancel_preload(&self, module: &str) -> bool {
        self.inner.preload.lock().cancel(module)
    }

    /// Schedule a preload for every critical or preload-flagged module.
    /// Returns how many were scheduled.
    pub fn preload_critical_modules(&self) -> usize {
        let mut candidates: Vec<String> = self
            .inner
            .modules
            .read()
            .values()
            .filter(|info| {
                info.critical_module
                    || info.preload_enabled
                    || info.strategy == LoadStrategy::Preload
            })
            .map(|info| info.module_name.clone())
            .collect();
        candidates.sort();

        candidates
            .iter()
            .filter(|module| self.schedule_preload(module, 0))
            .count()
    }

    #[must_use]
    pub fn preload_queue(&self) -> Vec<String> {
        self.inner.preload.lock().modules()
    }

    /// Queue a lazy load `timeout_ms` from now (0 = configured timeout).
    /// Returns false while lazy loading is disabled.
    pub fn schedule_lazy_load(&self, module: &str, timeout_ms: u64) -> bool {
        let (enabled, default_timeout) = {
            let config = self.inner.config.read();
            (config.lazy_loading, config.lazy_load_timeout_ms)
        };
        if !enabled {
            debug!(module = module, "Lazy loading disabled, not scheduled");
            return false;
        }

        let timeout_ms = if timeout_ms > 0 {
            timeout_ms
        } else {
            default_timeout
        };
        let due = self.now() + timeout_ms;
        self.inner.lazy.lock().schedule(module, due);
        debug!(module = module, timeout_ms, "Lazy load scheduled");
        true
    }

    pub fn cancel_lazy_load(&self, module: &str) -> bool {
        self.inner.lazy.lock().cancel(module)
    }

    /// Load `module` now, taking it off the lazy queue if it was waiting.
    pub fn trigger_lazy_load(&self, module: &str) -> bool {
        self.inner.lazy.lock().cancel(module);
        self.emit(OptimizerEvent::LazyLoadTriggered(module.to_string()));
        self.dispatch(module, LAZY_SESSION)
    }

    #[must_use]
    pub fn lazy_load_queue(&self) -> Vec<String> {
        self.inner.lazy.lock().modules()
    }

    /// Dispatch every due preload. Returns the dispatched modules.
    pub fn process_preload_queue(&self) -> Vec<String> {
        let now = self.now();
        let due = self.inner.preload.lock().take_due(now);
        for module in &due {
            self.dispatch(module, PRELOAD_SESSION);
        }
        due
    }

    /// Dispatch every due lazy load. Returns the dispatched modules.
    pub fn process_lazy_load_queue(&self) -> Vec<String> {
        let now = self.now();
        let due = self.inner.lazy.lock().take_due(now);
        for module in &due {
            self.emit(OptimizerEvent::LazyLoadTriggered(module.clone()));
            self.dispatch(module, LAZY_SESSION);
        }
        due
    }

    fn dispatch(&self, module: &str, origin: &'static str) -> bool {
        if Handle::try_current().is_err() {
            warn!(module = module, "No tokio runtime, load not dispatched");
            return false;
        }

        let optimizer = self.clone();
        let module = module.to_string();
        drop(self.inner.services.worker_pool.spawn(async move {
            let loaded = optimizer.load_one(&module, origin).await;
            if origin == PRELOAD_SESSION && loaded.is_ok() {
                optimizer.emit(OptimizerEvent::PreloadCompleted(module));
            }
        }));
        true
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    #[must_use]
    pub fn startup_metrics(&self) -> StartupMetrics {
        let total_modules = self.inner.modules.read().len();
        let records = self.inner.records.lock();
        let mut metrics = records.metrics.clone();
        metrics.total_modules = total_modules;
        metrics.module_load_time_ms = records.load_times.values().sum();

        let count = records.load_times.len();
        if count > 0 {
            let mean = metrics.module_load_time_ms as f64 / count as f64;
            let variance = records
                .load_times
                .values()
                .map(|&t| (t as f64 - mean).powi(2))
                .sum::<f64>()
                / count as f64;
            metrics.average_load_time_ms = mean;
            metrics.load_time_variance = variance;
        }
        metrics
    }

    /// Latest load time per module.
    #[must_use]
    pub fn module_load_times(&self) -> HashMap<String, u64> {
        self.inner.records.lock().load_times.clone()
    }

    /// Latest reported memory per module.
    #[must_use]
    pub fn module_memory_usage(&self) -> HashMap<String, u64> {
        self.inner.records.lock().memory_usage.clone()
    }

    /// Clear counters and latest figures. Load-time history is kept.
    pub fn reset_metrics(&self) {
        let mut records = self.inner.records.lock();
        records.metrics = StartupMetrics::default();
        records.load_times.clear();
        records.memory_usage.clear();
        info!("Startup metrics reset");
    }

    /// Step parallelism toward measured load times. Returns the new width.
    fn analyze_load_performance(&self) -> usize {
        let metrics = self.startup_metrics();
        let mut config = self.inner.config.write();
        if metrics.loaded_modules == 0 {
            return config.max_parallel_loads;
        }

        let before = config.max_parallel_loads;
        if metrics.average_load_time_ms > SLOW_LOAD_MS {
            config.max_parallel_loads = (before + 1).min(MAX_ADAPTIVE_PARALLEL_LOADS);
        } else if metrics.average_load_time_ms < FAST_LOAD_MS {
            config.max_parallel_loads = before.saturating_sub(1).max(MIN_ADAPTIVE_PARALLEL_LOADS);
        }
        if config.max_parallel_loads != before {
            info!(
                average_load_time_ms = metrics.average_load_time_ms,
                from = before,
                to = config.max_parallel_loads,
                "Parallel loads re-tuned"
            );
        }
        config.max_parallel_loads
    }

    /// Refresh load-time estimates from history and re-tune parallelism.
    /// Returns a summary of what changed.
    pub fn optimize_for_next_startup(&self) -> String {
        let estimates: Vec<(String, u64, Option<u64>)> = {
            let records = self.inner.records.lock();
            records
                .history
                .iter()
                .filter(|(_, history)| !history.is_empty())
                .map(|(module, history)| {
                    let average = history.iter().sum::<u64>() / history.len() as u64;
                    (
                        module.clone(),
                        average,
                        records.memory_usage.get(module).copied(),
                    )
                })
                .collect()
        };

        {
            let mut modules = self.inner.modules.write();
            for (module, load_time, memory) in &estimates {
                let info = modules
                    .entry(module.clone())
                    .or_insert_with(|| ModuleLoadInfo::new(module.as_str()));
                info.estimated_load_time_ms = *load_time;
                if let Some(memory) = memory {
                    info.estimated_memory_bytes = *memory;
                }
            }
        }

        let parallel = self.analyze_load_performance();
        let summary = format!(
            "Updated {} load estimates, max parallel loads {parallel}",
            estimates.len()
        );
        info!(estimates = estimates.len(), max_parallel_loads = parallel, "Optimized for next startup");
        self.emit(OptimizerEvent::OptimizationCompleted(summary.clone()));
        summary
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the preload and lazy-load timers.
    pub fn start(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, optimizer not started");
            return;
        };
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let (preload, lazy) = {
            let config = self.inner.config.read();
            (config.preload_interval_ms, config.lazy_load_interval_ms)
        };
        let weak = Arc::downgrade(&self.inner);

        let mut timers = self.inner.timers.lock();
        timers.push(spawn_periodic(&runtime, weak.clone(), preload, |inner| {
            StartupOptimizer { inner }.process_preload_queue();
        }));
        timers.push(spawn_periodic(&runtime, weak, lazy, |inner| {
            StartupOptimizer { inner }.process_lazy_load_queue();
        }));
        info!("Startup optimizer started");
    }

    /// Stop the timers and drop pending preloads and lazy loads.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handles: Vec<JoinHandle<()>> = self.inner.timers.lock().drain(..).collect();
        abort_all(handles);
        self.inner.preload.lock().clear();
        self.inner.lazy.lock().clear();
        info!("Startup optimizer stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for StartupOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupOptimizer")
            .field("modules", &self.inner.modules.read().len())
            .field("sessions", &self.inner.sessions.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::mocks::MockModuleLoader;
    use shared_types::{ManualClock, WorkerPool};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn setup(
        mut loader: MockModuleLoader,
        config: OptimizerConfig,
    ) -> (StartupOptimizer, Arc<MockModuleLoader>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(10_000));
        loader.clock = Some(clock.clone());
        let loader = Arc::new(loader);
        let services = CoreServices::default()
            .with_clock(clock.clone())
            .with_worker_pool(WorkerPool::new(4));
        let optimizer = StartupOptimizer::with_services(config, loader.clone(), services);
        (optimizer, loader, clock)
    }

    fn drain(rx: &mut broadcast::Receiver<OptimizerEvent>) -> Vec<OptimizerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn wait_for(
        rx: &mut broadcast::Receiver<OptimizerEvent>,
        predicate: impl Fn(&OptimizerEvent) -> bool,
    ) -> OptimizerEvent {
        tokio::time::timeout(Duration::from_secs(60), async {
            loop {
                let event = rx.recv().await.expect("event channel open");
                if predicate(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("event arrives")
    }

    #[tokio::test]
    async fn test_session_loads_in_dependency_batches() {
        let config = OptimizerConfig {
            max_parallel_loads: 2,
            ..OptimizerConfig::default()
        };
        let (opt, loader, _) = setup(MockModuleLoader::default(), config);
        opt.set_module_dependencies("B", names(&["A"]));
        opt.set_module_dependencies("C", names(&["A"]));
        let mut rx = opt.events();

        let session = opt.run_load_session(names(&["A", "B", "C"])).await;

        assert_eq!(session.state, SessionState::Completed);
        assert_eq!(session.batches, vec![names(&["A"]), names(&["B", "C"])]);
        assert_eq!(session.success_count, 3);
        assert_eq!(session.error_message, None);
        assert_eq!(loader.calls()[0], "A");
        assert_eq!(opt.startup_metrics().parallel_load_count, 2);

        let events = drain(&mut rx);
        assert!(matches!(
            events.first(),
            Some(OptimizerEvent::LoadSessionStarted { .. })
        ));
        assert!(matches!(
            events.last(),
            Some(OptimizerEvent::LoadSessionCompleted(_))
        ));
        assert_eq!(opt.load_session(&session.session_id), Some(session));
    }

    #[tokio::test]
    async fn test_failures_recorded_and_session_continues() {
        let (opt, loader, _) = setup(MockModuleLoader::failing(&["B"]), OptimizerConfig::default());
        let mut rx = opt.events();

        let session = opt.run_load_session(names(&["A", "B", "C"])).await;

        assert_eq!(session.state, SessionState::Failed);
        assert_eq!(session.success_count, 2);
        assert_eq!(session.failure_count, 1);
        assert!(session
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("Module B failed to load")));
        assert_eq!(loader.calls().len(), 3);

        let metrics = opt.startup_metrics();
        assert_eq!(metrics.loaded_modules, 2);
        assert_eq!(metrics.failed_modules, 1);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            OptimizerEvent::ModuleLoadFailed { module, .. } if module == "B"
        )));
        assert!(matches!(
            events.last(),
            Some(OptimizerEvent::LoadSessionFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_module_load_timeout() {
        let mut loader = MockModuleLoader::default();
        loader
            .delays
            .insert("slow".to_string(), Duration::from_secs(60));
        let config = OptimizerConfig {
            module_load_timeout_ms: 100,
            ..OptimizerConfig::default()
        };
        let (opt, _, _) = setup(loader, config);

        let session = opt.run_load_session(names(&["slow", "fast"])).await;

        assert_eq!(session.success_count, 1);
        assert_eq!(session.failure_count, 1);
        assert!(session
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("Module slow timed out after 100ms")));
    }

    #[tokio::test]
    async fn test_strict_mode_fails_on_cycle() {
        let (opt, loader, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.set_module_dependencies("A", names(&["B"]));
        opt.set_module_dependencies("B", names(&["A"]));
        opt.set_strict_dependencies(true);

        let session = opt.run_load_session(names(&["A", "B"])).await;

        assert_eq!(session.state, SessionState::Failed);
        assert!(session
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Dependency cycle")));
        assert!(loader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_lenient_mode_forces_cycle() {
        let (opt, loader, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.set_module_dependencies("A", names(&["B"]));
        opt.set_module_dependencies("B", names(&["A"]));

        let session = opt.run_load_session(names(&["A", "B"])).await;

        assert_eq!(session.state, SessionState::Completed);
        assert_eq!(session.batches, vec![names(&["A"]), names(&["B"])]);
        assert_eq!(loader.calls(), names(&["A", "B"]));
    }

    #[tokio::test]
    async fn test_priority_orders_independent_modules() {
        let config = OptimizerConfig {
            parallel_loading: false,
            ..OptimizerConfig::default()
        };
        let (opt, loader, _) = setup(MockModuleLoader::default(), config);
        opt.set_module_priority("ui", 1);
        opt.set_module_priority("core", 10);

        opt.run_load_session(names(&["ui", "plugins", "core"])).await;

        assert_eq!(loader.calls(), names(&["core", "ui", "plugins"]));
    }

    #[tokio::test]
    async fn test_load_times_and_memory_recorded() {
        let mut loader = MockModuleLoader::default();
        loader.clock_costs.insert("a".to_string(), 300);
        loader.clock_costs.insert("b".to_string(), 700);
        loader.memory_per_module = 1024;
        let config = OptimizerConfig {
            parallel_loading: false,
            ..OptimizerConfig::default()
        };
        let (opt, _, _) = setup(loader, config);

        let session = opt.run_load_session(names(&["a", "b"])).await;

        assert_eq!(session.module_load_times["a"], 300);
        assert_eq!(session.module_load_times["b"], 700);
        assert_eq!(session.module_memory_usage["b"], 1024);
        assert_eq!(session.total_load_time_ms, 1000);

        let metrics = opt.startup_metrics();
        assert_eq!(metrics.module_load_time_ms, 1000);
        assert_eq!(metrics.total_startup_time_ms, 1000);
        assert!((metrics.average_load_time_ms - 500.0).abs() < f64::EPSILON);
        assert!((metrics.load_time_variance - 40_000.0).abs() < f64::EPSILON);
        assert_eq!(metrics.final_memory_usage, 2048);
        assert_eq!(opt.module_load_times().len(), 2);
        assert_eq!(opt.module_memory_usage()["a"], 1024);

        opt.reset_metrics();
        assert!(opt.module_load_times().is_empty());
        assert_eq!(opt.startup_metrics().loaded_modules, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_next_batch() {
        let (opt, loader, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let mut rx = opt.events();

        let id = opt.start_load_session(names(&["a", "b"]));
        opt.pause_load_session(&id).unwrap();
        assert!(matches!(
            opt.pause_load_session(&id),
            Err(OptimizerError::InvalidSessionState { .. })
        ));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(loader.calls().is_empty());
        assert_eq!(opt.load_session(&id).unwrap().state, SessionState::Paused);

        opt.resume_load_session(&id).unwrap();
        wait_for(&mut rx, |e| matches!(e, OptimizerEvent::LoadSessionCompleted(_))).await;

        assert_eq!(loader.calls().len(), 2);
        assert_eq!(opt.load_session(&id).unwrap().state, SessionState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_session() {
        let (opt, loader, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let mut rx = opt.events();

        let id = opt.start_load_session(names(&["a", "b"]));
        opt.pause_load_session(&id).unwrap();
        opt.stop_load_session(&id).unwrap();

        let event = wait_for(&mut rx, |e| matches!(e, OptimizerEvent::LoadSessionCompleted(_))).await;
        let OptimizerEvent::LoadSessionCompleted(session) = event else {
            unreachable!()
        };
        assert_eq!(session.state, SessionState::Stopped);
        assert!(loader.calls().is_empty());

        assert!(matches!(
            opt.stop_load_session(&id),
            Err(OptimizerError::InvalidSessionState { .. })
        ));
        assert_eq!(
            opt.stop_load_session("missing"),
            Err(OptimizerError::SessionNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_start_without_runtime_fails_session() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let id = opt.start_load_session(names(&["a"]));
        let session = opt.load_session(&id).unwrap();
        assert_eq!(session.state, SessionState::Failed);
        assert_eq!(session.error_message.as_deref(), Some("no async runtime"));
    }

    #[tokio::test]
    async fn test_preload_queue() {
        let (opt, loader, clock) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let mut rx = opt.events();

        assert!(opt.schedule_preload("audio", 0));
        assert_eq!(opt.preload_queue(), names(&["audio"]));
        assert!(opt.process_preload_queue().is_empty());

        clock.advance(1000);
        assert_eq!(opt.process_preload_queue(), names(&["audio"]));
        let done = wait_for(&mut rx, |e| matches!(e, OptimizerEvent::PreloadCompleted(_))).await;
        assert_eq!(done, OptimizerEvent::PreloadCompleted("audio".to_string()));
        assert_eq!(loader.calls(), names(&["audio"]));
        assert!(opt.preload_queue().is_empty());

        opt.enable_preloading(false, 1000);
        assert!(!opt.schedule_preload("video", 0));
    }

    #[test]
    fn test_cancel_preload() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.schedule_preload("audio", 10);
        assert!(opt.cancel_preload("audio"));
        assert!(!opt.cancel_preload("audio"));
        assert!(opt.preload_queue().is_empty());
    }

    #[test]
    fn test_preload_critical_modules() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.set_module_load_info("core", ModuleLoadInfo::new("core").critical());
        opt.set_module_load_strategy("themes", LoadStrategy::Preload);
        opt.set_module_priority("ui", 1);

        assert_eq!(opt.preload_critical_modules(), 2);
        assert_eq!(opt.preload_queue(), names(&["core", "themes"]));
    }

    #[tokio::test]
    async fn test_lazy_load_trigger_and_queue() {
        let (opt, loader, clock) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let mut rx = opt.events();

        assert!(opt.schedule_lazy_load("chat", 500));
        assert_eq!(opt.lazy_load_queue(), names(&["chat"]));
        assert!(opt.trigger_lazy_load("chat"));
        assert!(opt.lazy_load_queue().is_empty());
        wait_for(&mut rx, |e| {
            matches!(
                e,
                OptimizerEvent::ModuleLoadCompleted { module, session_id, .. }
                    if module == "chat" && session_id == LAZY_SESSION
            )
        })
        .await;

        assert!(opt.schedule_lazy_load("stats", 0));
        clock.advance(29_999);
        assert!(opt.process_lazy_load_queue().is_empty());
        clock.advance(1);
        assert_eq!(opt.process_lazy_load_queue(), names(&["stats"]));
        wait_for(&mut rx, |e| {
            matches!(e, OptimizerEvent::ModuleLoadCompleted { module, .. } if module == "stats")
        })
        .await;
        assert_eq!(loader.calls(), names(&["chat", "stats"]));

        assert!(opt.schedule_lazy_load("extra", 0));
        assert!(opt.cancel_lazy_load("extra"));
        opt.enable_lazy_loading(false, 0);
        assert!(!opt.schedule_lazy_load("extra", 0));
    }

    #[test]
    fn test_module_configuration() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.set_module_priority("net", 5);
        opt.set_module_dependencies("net", names(&["core"]));

        let info = opt.module_load_info("net");
        assert_eq!(info.module_name, "net");
        assert_eq!(info.priority, 5);
        assert_eq!(info.dependencies, names(&["core"]));
        assert_eq!(opt.registered_modules(), names(&["net"]));
        assert_eq!(opt.module_load_info("unknown").module_name, "unknown");
    }

    #[test]
    fn test_planning_facade() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.set_module_dependencies("app", names(&["ui"]));
        opt.set_module_dependencies("ui", names(&["core"]));

        assert_eq!(opt.resolve_dependencies("app"), names(&["core", "ui", "app"]));
        assert!(!opt.validate_dependencies(&names(&["app", "ui"])));
        assert!(opt.validate_dependencies(&names(&["app", "ui", "core"])));

        opt.enable_parallel_loading(false, 4);
        assert_eq!(
            opt.create_load_batches(&names(&["x", "y"])),
            vec![names(&["x"]), names(&["y"])]
        );
    }

    #[test]
    fn test_optimization_levels() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());

        opt.set_optimization_level(OptimizationLevel::None);
        let config = opt.config();
        assert_eq!(config.batch_width(), 1);
        assert!(!config.preloading);
        assert!(!config.lazy_loading);

        opt.set_optimization_level(OptimizationLevel::Aggressive);
        let config = opt.config();
        assert_eq!(config.batch_width(), 8);
        assert!(config.preloading);

        opt.set_optimization_level(OptimizationLevel::Basic);
        assert_eq!(opt.config().batch_width(), 2);

        // No measurements yet, so adaptive keeps the width
        opt.set_optimization_level(OptimizationLevel::Adaptive);
        assert_eq!(opt.config().max_parallel_loads, 2);
        assert_eq!(opt.optimization_level(), OptimizationLevel::Adaptive);
    }

    #[test]
    fn test_performance_profile() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let mut profile = PerformanceProfile {
            profile_name: "fast".to_string(),
            optimization_level: OptimizationLevel::Aggressive,
            max_parallel_loads: 6,
            ..PerformanceProfile::default()
        };
        profile
            .module_configs
            .insert("core".to_string(), ModuleLoadInfo::new("core").with_priority(9));

        opt.set_performance_profile(profile);

        let current = opt.performance_profile();
        assert_eq!(current.profile_name, "fast");
        assert_eq!(current.max_parallel_loads, 6);
        assert_eq!(current.module_configs["core"].priority, 9);
        assert_eq!(opt.module_load_info("core").priority, 9);
    }

    #[tokio::test]
    async fn test_optimize_for_next_startup() {
        let mut loader = MockModuleLoader::default();
        loader.clock_costs.insert("slow".to_string(), 6000);
        let (opt, _, _) = setup(loader, OptimizerConfig::default());
        let mut rx = opt.events();

        opt.run_load_session(names(&["slow"])).await;
        let summary = opt.optimize_for_next_startup();

        assert_eq!(opt.config().max_parallel_loads, 5);
        assert_eq!(opt.module_load_info("slow").estimated_load_time_ms, 6000);
        assert!(summary.contains("max parallel loads 5"));
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, OptimizerEvent::OptimizationCompleted(_))));
    }

    #[test]
    fn test_start_outside_runtime_can_be_retried() {
        let (opt, _, _) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        opt.start();
        assert!(!opt.is_running());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            opt.start();
            assert!(opt.is_running());
            opt.stop();
        });
        assert!(!opt.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_timer() {
        let (opt, loader, clock) = setup(MockModuleLoader::default(), OptimizerConfig::default());
        let mut rx = opt.events();
        opt.schedule_preload("audio", 0);
        clock.advance(1000);

        opt.start();
        wait_for(&mut rx, |e| matches!(e, OptimizerEvent::PreloadCompleted(_))).await;
        assert_eq!(loader.calls(), names(&["audio"]));

        opt.schedule_preload("video", 0);
        opt.stop();
        assert!(!opt.is_running());
        assert!(opt.preload_queue().is_empty());
    }
}
