//! Periodic background tasks.
//!
//! Each task holds only a `Weak` reference to its component, so dropping the
//! last strong handle ends the loop on the next tick.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Run `tick` every `period_ms` until `target` is dropped or the task is
/// aborted. The first call happens one full period after spawning.
pub fn spawn_periodic<T>(
    runtime: &Handle,
    target: Weak<T>,
    period_ms: u64,
    tick: fn(Arc<T>),
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
{
    runtime.spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(period_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            let Some(target) = target.upgrade() else {
                break;
            };
            tick(target);
        }
    })
}

/// Abort every handle.
pub fn abort_all(handles: impl IntoIterator<Item = JoinHandle<()>>) {
    for handle in handles {
        handle.abort();
    }
}
