//! # Module Core
//!
//! Owns the four orchestration components and manages their lifecycle.
//!
//! ## Construction Order
//!
//! ```text
//! Phase 1: Shared services (clock, size estimator, worker pool)
//! Phase 2: Communication bus, resource manager
//! Phase 3: Startup optimizer (needs the host's module loader)
//! Phase 4: Performance integrator (reads all three)
//! ```
//!
//! Every component is a cheap-to-clone handle; the getters hand out
//! references that can be cloned into host modules.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument};

use mc_01_communication_bus::CommunicationBus;
use mc_02_resource_manager::ResourceManager;
use mc_03_startup_optimizer::{LoadSession, ModuleLoader, StartupOptimizer};
use shared_types::{CoreServices, WorkerPool};

use crate::container::config::CoreConfig;
use crate::integrator::PerformanceIntegrator;

/// Container the host constructs once and passes to its modules.
pub struct ModuleCore {
    bus: CommunicationBus,
    resources: ResourceManager,
    optimizer: StartupOptimizer,
    integrator: PerformanceIntegrator,
    services: CoreServices,
    config: CoreConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl ModuleCore {
    /// Build all components with default services.
    pub fn new(config: CoreConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let mut services = CoreServices::default();
        if let Some(size) = config.worker_pool_size {
            services = services.with_worker_pool(WorkerPool::new(size));
        }
        Self::with_services(config, loader, services)
    }

    /// Build all components around the given services.
    #[instrument(name = "module_core_init", skip_all)]
    pub fn with_services(
        config: CoreConfig,
        loader: Arc<dyn ModuleLoader>,
        services: CoreServices,
    ) -> Self {
        info!("Phase 1: Shared services ready");
        info!(workers = services.worker_pool.size(), "  Worker pool sized");

        info!("Phase 2: Creating communication bus and resource manager");
        let bus = CommunicationBus::with_services(config.bus.clone(), services.clone());
        let resources = ResourceManager::with_services(config.resources.clone(), services.clone());
        info!(
            max_queue = config.bus.max_queue_size,
            max_memory = config.resources.max_memory_bytes,
            "  Bus and resource manager created"
        );

        info!("Phase 3: Creating startup optimizer");
        let optimizer =
            StartupOptimizer::with_services(config.optimizer.clone(), loader, services.clone());

        info!("Phase 4: Creating performance integrator");
        let integrator = PerformanceIntegrator::with_clock(
            bus.clone(),
            resources.clone(),
            optimizer.clone(),
            config.integrator.clone(),
            services.clock.clone(),
        );

        let (shutdown_tx, _) = watch::channel(false);
        info!("Module core constructed");

        Self {
            bus,
            resources,
            optimizer,
            integrator,
            services,
            config,
            shutdown_tx,
        }
    }

    /// Start every component's timers. The integrator starts the other three.
    pub fn initialize(&self) {
        info!("Starting module core");
        self.shutdown_tx.send_replace(false);
        self.integrator.initialize();
    }

    /// Bring the given modules up in one load session.
    pub async fn load_modules(&self, modules: Vec<String>) -> LoadSession {
        self.optimizer.run_load_session(modules).await
    }

    /// Stop every component and signal shutdown to subscribers.
    pub fn shutdown(&self) {
        info!("Shutting down module core");
        self.integrator.shutdown();
        self.shutdown_tx.send_replace(true);
    }

    /// Receiver that flips to `true` when [`shutdown`](Self::shutdown) runs.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    // =========================================================================
    // ACCESSOR METHODS
    // =========================================================================

    #[must_use]
    pub fn communication_bus(&self) -> &CommunicationBus {
        &self.bus
    }

    #[must_use]
    pub fn resource_manager(&self) -> &ResourceManager {
        &self.resources
    }

    #[must_use]
    pub fn startup_optimizer(&self) -> &StartupOptimizer {
        &self.optimizer
    }

    #[must_use]
    pub fn performance_integrator(&self) -> &PerformanceIntegrator {
        &self.integrator
    }

    #[must_use]
    pub fn services(&self) -> &CoreServices {
        &self.services
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

impl std::fmt::Debug for ModuleCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCore")
            .field("bus_running", &self.bus.is_running())
            .field("optimizer", &self.optimizer)
            .field("integrator", &self.integrator)
            .finish()
    }
}
