//! # Health Score
//!
//! `100 - Σ penalties`. Each penalty grows linearly from zero at its fine
//! threshold to its full weight at its bad threshold.
//!
//! | Input | Weight | Fine | Bad |
//! |-------|--------|------|-----|
//! | memory usage / threshold | 30 | 0.8 | 1.0 |
//! | bus average latency (ms) | 25 | 500 | 1000 |
//! | cache hit ratio | 20 | 0.8 | 0.5 |
//! | average module load time (ms) | 15 | 2000 | 5000 |
//! | message drop rate | 10 | 0.01 | 0.05 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear penalty between two thresholds. `bad` may sit below `fine` for
/// inputs where lower is worse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalty {
    pub weight: f64,
    pub fine: f64,
    pub bad: f64,
}

impl Penalty {
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        let span = self.bad - self.fine;
        if span == 0.0 || value.is_nan() {
            return 0.0;
        }
        let fraction = ((value - self.fine) / span).clamp(0.0, 1.0);
        fraction * self.weight
    }
}

pub const MEMORY_PENALTY: Penalty = Penalty {
    weight: 30.0,
    fine: 0.8,
    bad: 1.0,
};
pub const LATENCY_PENALTY: Penalty = Penalty {
    weight: 25.0,
    fine: 500.0,
    bad: 1000.0,
};
pub const HIT_RATIO_PENALTY: Penalty = Penalty {
    weight: 20.0,
    fine: 0.8,
    bad: 0.5,
};
pub const LOAD_TIME_PENALTY: Penalty = Penalty {
    weight: 15.0,
    fine: 2000.0,
    bad: 5000.0,
};
pub const DROP_RATE_PENALTY: Penalty = Penalty {
    weight: 10.0,
    fine: 0.01,
    bad: 0.05,
};

/// The five readings the score is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Memory usage divided by the memory threshold
    pub memory_ratio: f64,
    pub average_latency_ms: f64,
    /// 1.0 when the cache has not been read yet
    pub hit_ratio: f64,
    pub average_load_time_ms: f64,
    pub drop_rate: f64,
}

impl Default for ScoreInputs {
    fn default() -> Self {
        Self {
            memory_ratio: 0.0,
            average_latency_ms: 0.0,
            hit_ratio: 1.0,
            average_load_time_ms: 0.0,
            drop_rate: 0.0,
        }
    }
}

/// Health score in `[0, 100]`.
#[must_use]
pub fn performance_score(inputs: &ScoreInputs) -> u32 {
    let penalties = MEMORY_PENALTY.apply(inputs.memory_ratio)
        + LATENCY_PENALTY.apply(inputs.average_latency_ms)
        + HIT_RATIO_PENALTY.apply(inputs.hit_ratio)
        + LOAD_TIME_PENALTY.apply(inputs.average_load_time_ms)
        + DROP_RATE_PENALTY.apply(inputs.drop_rate);

    (100.0 - penalties).round().clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceLevel {
    Poor,
    Fair,
    Good,
    #[default]
    Excellent,
}

impl PerformanceLevel {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Fair,
            _ => Self::Poor,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
