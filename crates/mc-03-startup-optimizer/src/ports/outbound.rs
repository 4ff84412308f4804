//! Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::ModuleLoadReport;
use crate::domain::errors::ModuleLoadError;
use async_trait::async_trait;

/// Brings a module up on behalf of the optimizer.
///
/// Implementations must be safe to call concurrently for different modules;
/// the optimizer never loads the same module twice within one session.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load `module_name` and report what it cost.
    async fn load_module(&self, module_name: &str) -> Result<ModuleLoadReport, ModuleLoadError>;
}

/// Mock implementations for testing
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use shared_types::ManualClock;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::Duration;

    /// Loader that records call order and can fail, stall or take time.
    #[derive(Default)]
    pub struct MockModuleLoader {
        pub calls: Mutex<Vec<String>>,
        pub failing: HashSet<String>,
        /// Real (tokio) delay per module
        pub delays: HashMap<String, Duration>,
        /// Simulated load time added to the manual clock per module
        pub clock_costs: HashMap<String, u64>,
        pub clock: Option<Arc<ManualClock>>,
        pub memory_per_module: u64,
    }

    impl MockModuleLoader {
        pub fn failing(modules: &[&str]) -> Self {
            Self {
                failing: modules.iter().map(|m| m.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ModuleLoader for MockModuleLoader {
        async fn load_module(
            &self,
            module_name: &str,
        ) -> Result<ModuleLoadReport, ModuleLoadError> {
            self.calls.lock().push(module_name.to_string());
            if let Some(delay) = self.delays.get(module_name) {
                tokio::time::sleep(*delay).await;
            }
            if let (Some(clock), Some(cost)) = (&self.clock, self.clock_costs.get(module_name)) {
                clock.advance(*cost);
            }
            if self.failing.contains(module_name) {
                return Err(ModuleLoadError::Failed {
                    module: module_name.to_string(),
                    reason: "mock failure".to_string(),
                });
            }
            Ok(ModuleLoadReport {
                memory_usage_bytes: self.memory_per_module,
            })
        }
    }
}
