//! # Eviction Selection
//!
//! Pure victim selection for the TTL, LFU and Adaptive policies. Callers
//! decide what removing a victim means.

use super::entry::{CachePolicy, ResourceEntry, ResourceKey};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::fmt;

/// Most entries one LFU pass may evict
pub const LFU_MAX_VICTIMS: usize = 10;
/// Most entries one Adaptive pass may evict
pub const ADAPTIVE_MAX_VICTIMS: usize = 5;

/// Why a resource left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvictionReason {
    TtlExpired,
    LeastFrequentlyUsed,
    Adaptive,
    LeastRecentlyUsed,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TtlExpired => "TTL expired",
            Self::LeastFrequentlyUsed => "LFU eviction",
            Self::Adaptive => "Adaptive eviction",
            Self::LeastRecentlyUsed => "LRU eviction",
        };
        f.write_str(text)
    }
}

/// Keys of every expired entry.
pub fn ttl_expired<'a>(
    entries: impl IntoIterator<Item = &'a ResourceEntry>,
    now: Timestamp,
) -> Vec<ResourceKey> {
    entries
        .into_iter()
        .filter(|e| e.is_expired(now))
        .map(|e| e.key.clone())
        .collect()
}

/// Lowest 10% by access count among LFU-tagged candidates, at most
/// [`LFU_MAX_VICTIMS`] per pass.
///
/// Ties are broken by key so the selection is deterministic.
pub fn lfu_victims(candidates: &[&ResourceEntry]) -> Vec<ResourceKey> {
    let mut lfu: Vec<&ResourceEntry> = candidates
        .iter()
        .copied()
        .filter(|e| e.cache_policy == CachePolicy::Lfu)
        .collect();
    let quota = (lfu.len() / 10).min(LFU_MAX_VICTIMS);
    if quota == 0 {
        return Vec::new();
    }

    lfu.sort_by(|a, b| {
        a.access_count
            .cmp(&b.access_count)
            .then_with(|| a.key.cmp(&b.key))
    });
    lfu.into_iter().take(quota).map(|e| e.key.clone()).collect()
}

/// Eviction score: grows with idle time and shrinks with use.
#[must_use]
pub fn adaptive_score(entry: &ResourceEntry, now: Timestamp) -> f64 {
    let idle_secs = entry.idle_ms(now) as f64 / 1000.0;
    0.7 * idle_secs + 0.3 * (1.0 / (entry.access_count as f64 + 1.0))
}

/// Highest 5% by adaptive score among Adaptive-tagged candidates, at most
/// [`ADAPTIVE_MAX_VICTIMS`] per pass.
pub fn adaptive_victims(candidates: &[&ResourceEntry], now: Timestamp) -> Vec<ResourceKey> {
    let mut scored: Vec<(f64, &ResourceEntry)> = candidates
        .iter()
        .copied()
        .filter(|e| e.cache_policy == CachePolicy::Adaptive)
        .map(|e| (adaptive_score(e, now), e))
        .collect();
    let quota = (scored.len() / 20).min(ADAPTIVE_MAX_VICTIMS);
    if quota == 0 {
        return Vec::new();
    }

    scored.sort_by(|(sa, a), (sb, b)| sb.total_cmp(sa).then_with(|| a.key.cmp(&b.key)));
    scored
        .into_iter()
        .take(quota)
        .map(|(_, e)| e.key.clone())
        .collect()
}
