//! # Worker Pool
//!
//! Bounded concurrency for background work. Tasks are spawned onto the tokio
//! runtime immediately but only `size` of them run their body at once; the
//! rest wait for a permit in FIFO order.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool running at most `size` tasks concurrently (minimum 1).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Pool sized to the number of available CPUs.
    #[must_use]
    pub fn with_available_parallelism() -> Self {
        Self::new(num_cpus::get())
    }

    /// Spawn a task that runs once a worker slot is free.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = permits.acquire_owned().await.ok();
            task.await
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks currently holding a worker slot.
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.size.saturating_sub(self.permits.available_permits())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        let pool = Self::with_available_parallelism();
        debug!(size = pool.size, "Worker pool created");
        pool
    }
}
