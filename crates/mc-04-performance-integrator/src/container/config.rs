//! # Core Configuration
//!
//! One struct the host hands to [`ModuleCore`](super::ModuleCore), holding
//! each component's configuration.

use crate::config::IntegratorConfig;
use mc_01_communication_bus::BusConfig;
use mc_02_resource_manager::ResourceConfig;
use mc_03_startup_optimizer::OptimizerConfig;
use serde::{Deserialize, Serialize};

/// Complete core configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Communication bus configuration.
    pub bus: BusConfig,
    /// Resource manager configuration.
    pub resources: ResourceConfig,
    /// Startup optimizer configuration.
    pub optimizer: OptimizerConfig,
    /// Performance integrator configuration.
    pub integrator: IntegratorConfig,
    /// Worker pool size shared by async sends and module loads. `None` uses
    /// the available parallelism.
    pub worker_pool_size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert!(config.worker_pool_size.is_none());
        assert!(config.integrator.auto_optimization);
    }

    #[test]
    fn test_partial_json_is_rejected_without_all_sections() {
        let json = serde_json::to_string(&CoreConfig::default()).unwrap();
        let parsed: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.worker_pool_size, None);
        assert!(serde_json::from_str::<CoreConfig>("{}").is_err());
    }
}
