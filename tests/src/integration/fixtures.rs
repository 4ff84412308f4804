//! # Shared Fixtures
//!
//! A scripted module loader and a `ModuleCore` wired to a manual clock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use mc_03_startup_optimizer::{ModuleLoadError, ModuleLoadReport, ModuleLoader};
use mc_04_performance_integrator::{CoreConfig, ModuleCore};
use shared_types::{CoreServices, ManualClock};

/// Loader whose outcome per module is scripted up front.
///
/// Records the order in which loads start and finish.
#[derive(Default)]
pub struct ScriptedLoader {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    memory: HashMap<String, u64>,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, module: &str) -> Self {
        self.failing.insert(module.to_string());
        self
    }

    pub fn delayed(mut self, module: &str, delay: Duration) -> Self {
        self.delays.insert(module.to_string(), delay);
        self
    }

    pub fn with_memory(mut self, module: &str, bytes: u64) -> Self {
        self.memory.insert(module.to_string(), bytes);
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().clone()
    }
}

#[async_trait]
impl ModuleLoader for ScriptedLoader {
    async fn load_module(&self, module: &str) -> Result<ModuleLoadReport, ModuleLoadError> {
        self.started.lock().push(module.to_string());

        if let Some(delay) = self.delays.get(module) {
            tokio::time::sleep(*delay).await;
        }

        self.finished.lock().push(module.to_string());

        if self.failing.contains(module) {
            return Err(ModuleLoadError::Failed {
                module: module.to_string(),
                reason: "scripted failure".into(),
            });
        }
        Ok(ModuleLoadReport {
            memory_usage_bytes: self.memory.get(module).copied().unwrap_or(0),
        })
    }
}

/// Core plus the handles a test needs to drive it.
pub struct TestCore {
    pub core: ModuleCore,
    pub clock: Arc<ManualClock>,
    pub loader: Arc<ScriptedLoader>,
}

/// Build a core on a manual clock starting at 1,000 ms.
pub fn test_core(config: CoreConfig, loader: ScriptedLoader) -> TestCore {
    let clock = Arc::new(ManualClock::new(1_000));
    let loader = Arc::new(loader);
    let services = CoreServices::default().with_clock(clock.clone());
    let core = ModuleCore::with_services(config, loader.clone(), services);
    TestCore {
        core,
        clock,
        loader,
    }
}
