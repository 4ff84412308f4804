//! Injected collaborators shared by the orchestration components.

use crate::clock::{SharedClock, SystemClock};
use crate::size::{JsonSizeEstimator, SharedSizeEstimator};
use crate::worker_pool::WorkerPool;
use std::sync::Arc;

/// Clock, size estimator and worker pool handed to each component.
///
/// Components built from the same `CoreServices` share one worker pool.
#[derive(Clone)]
pub struct CoreServices {
    pub clock: SharedClock,
    pub size_estimator: SharedSizeEstimator,
    pub worker_pool: WorkerPool,
}

impl CoreServices {
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_size_estimator(mut self, estimator: SharedSizeEstimator) -> Self {
        self.size_estimator = estimator;
        self
    }

    #[must_use]
    pub fn with_worker_pool(mut self, pool: WorkerPool) -> Self {
        self.worker_pool = pool;
        self
    }
}

impl Default for CoreServices {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            size_estimator: JsonSizeEstimator::shared(),
            worker_pool: WorkerPool::default(),
        }
    }
}

impl std::fmt::Debug for CoreServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreServices")
            .field("now_ms", &self.clock.now_ms())
            .field("worker_pool", &self.worker_pool)
            .finish()
    }
}
