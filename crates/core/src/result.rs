//! Run summary representation.

use crate::sa::SaStats;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Summary of a nesting run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveSummary {
    /// Strategy used.
    pub strategy: String,

    /// Number of containers (bins) in the final packing.
    pub containers_used: usize,

    /// Number of placements across all containers.
    pub placed: usize,

    /// Remaining demand after the run.
    pub remaining: usize,

    /// Fitness of the final packing.
    pub fitness: f64,

    /// Placed area over total area of the containers used (0.0 - 1.0).
    pub utilization: f64,

    /// Utilization of every container, in container order.
    pub container_utilization: Vec<f64>,

    /// Wall time of the run.
    pub elapsed: Duration,

    /// Annealing statistics (simulated annealing only).
    pub sa: Option<SaStats>,
}

impl SolveSummary {
    /// Creates an empty summary for the given strategy.
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            ..Default::default()
        }
    }

    /// Returns true if every demanded shape was placed.
    pub fn all_placed(&self) -> bool {
        self.remaining == 0
    }

    /// Returns utilization as a percentage string.
    pub fn utilization_percent(&self) -> String {
        format!("{:.1}%", self.utilization * 100.0)
    }

    /// Attaches annealing statistics.
    pub fn with_sa_stats(mut self, stats: SaStats) -> Self {
        self.sa = Some(stats);
        self
    }
}
