//! Error types for the Startup Optimizer

use thiserror::Error;

/// Errors returned by session control and dependency planning
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    #[error("Load session not found: {0}")]
    SessionNotFound(String),

    /// Raised only when strict dependency checking is on
    #[error("Dependency cycle among: {}", modules.join(", "))]
    CycleDetected { modules: Vec<String> },

    #[error("Module {module} depends on unregistered module {dependency}")]
    MissingDependency { module: String, dependency: String },

    #[error("Load session {session_id} cannot {action} while {state}")]
    InvalidSessionState {
        session_id: String,
        action: &'static str,
        state: String,
    },
}

/// Errors reported by a [`crate::ModuleLoader`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleLoadError {
    #[error("Module {module} failed to load: {reason}")]
    Failed { module: String, reason: String },

    #[error("Module {module} timed out after {timeout_ms}ms")]
    TimedOut { module: String, timeout_ms: u64 },
}
