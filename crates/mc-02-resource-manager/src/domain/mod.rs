//! Domain layer for the Resource Manager.

pub mod cache;
pub mod entry;
pub mod errors;
pub mod eviction;
pub mod pool;
pub mod shared;
pub mod stats;

pub use cache::{Admission, CacheTier};
pub use entry::{CachePolicy, ResourceEntry, ResourceKey, ResourceType, GLOBAL_OWNER};
pub use errors::ResourceError;
pub use eviction::EvictionReason;
pub use pool::{PoolInfo, ResourcePool};
pub use shared::{Resolved, SharedObjectRegistry};
pub use stats::CacheStatistics;
