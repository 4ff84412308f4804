//! # Size Estimation
//!
//! Byte-size estimate of an opaque payload. Used for the bus payload cap and
//! for resource cache cost accounting.

use crate::Payload;
use std::sync::Arc;

/// Estimates the in-memory size of a payload.
pub trait SizeEstimator: Send + Sync {
    fn estimate(&self, payload: &Payload) -> u64;
}

/// Estimator handle shared between components.
pub type SharedSizeEstimator = Arc<dyn SizeEstimator>;

/// Default estimator: length of the compact JSON encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSizeEstimator;

impl JsonSizeEstimator {
    #[must_use]
    pub fn shared() -> SharedSizeEstimator {
        Arc::new(Self)
    }
}

impl SizeEstimator for JsonSizeEstimator {
    fn estimate(&self, payload: &Payload) -> u64 {
        match payload {
            Payload::Null => 0,
            other => serde_json::to_vec(other)
                .map(|bytes| bytes.len() as u64)
                .unwrap_or(0),
        }
    }
}
