//! Outbound notifications of the Startup Optimizer.

use crate::domain::entities::LoadSession;

/// Session id used for loads dispatched from the preload queue
pub const PRELOAD_SESSION: &str = "preload";
/// Session id used for lazy and on-demand loads
pub const LAZY_SESSION: &str = "lazy";

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerEvent {
    ModuleLoadStarted {
        module: String,
        session_id: String,
    },
    ModuleLoadCompleted {
        module: String,
        session_id: String,
        load_time_ms: u64,
    },
    ModuleLoadFailed {
        module: String,
        session_id: String,
        error: String,
    },
    LoadSessionStarted {
        session_id: String,
        modules: Vec<String>,
    },
    LoadSessionCompleted(Box<LoadSession>),
    LoadSessionFailed {
        session_id: String,
        error: String,
    },
    PreloadScheduled {
        module: String,
        delay_ms: u64,
    },
    PreloadCompleted(String),
    LazyLoadTriggered(String),
    OptimizationCompleted(String),
}
