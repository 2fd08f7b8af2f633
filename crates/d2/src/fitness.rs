//! Packing fitness (higher is better, at most 1 for overlap-free layouts).
//!
//! The score combines three "badness" terms, each in `[0, 1]` for a valid
//! layout:
//!
//! | Term | Per container | Aggregation |
//! |------|---------------|-------------|
//! | utilization | `1 - placed / (W * H)`, last container uses its envelope area | mean |
//! | compaction | `1 - placed / convex hull area` | mean |
//! | free strip | free band above the highest placement | `(W * H - max band) / (W * H)` |
//!
//! `fitness = 1 - (w1 * utilization + w2 * compaction + w3 * free strip)`

use crate::kernel::{convex_hull_area, envelope};
use crate::packing::{Container, ContainerSize};
use polynest_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Weights of the three fitness terms.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitnessWeights {
    pub utilization: f64,
    pub compaction: f64,
    pub free_strip: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            utilization: 0.5,
            compaction: 0.5,
            free_strip: 0.0,
        }
    }
}

impl FitnessWeights {
    /// Creates validated weights.
    pub fn new(utilization: f64, compaction: f64, free_strip: f64) -> Result<Self> {
        let weights = Self {
            utilization,
            compaction,
            free_strip,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Weights must be non-negative and sum to 1.
    pub fn validate(&self) -> Result<()> {
        let all = [self.utilization, self.compaction, self.free_strip];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::ConfigError(format!(
                "Fitness weights must be non-negative, got {:?}",
                all
            )));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(Error::ConfigError(format!(
                "Fitness weights must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Scores a (possibly hypothetical) list of containers.
///
/// Pure: optimizers call it on cloned candidate layouts before committing.
/// An empty container contributes 1 to the averaged terms; no containers
/// at all scores 0.
pub fn fitness(containers: &[Container], size: ContainerSize, weights: &FitnessWeights) -> f64 {
    if containers.is_empty() {
        return 0.0;
    }

    let n = containers.len() as f64;
    let last = containers.len() - 1;

    let utilization = containers
        .iter()
        .enumerate()
        .map(|(i, c)| utilization_term(c, size, i == last))
        .sum::<f64>()
        / n;

    let compaction = containers.iter().map(compaction_term).sum::<f64>() / n;

    let strip = if weights.free_strip > 0.0 {
        free_strip_term(containers, size)
    } else {
        0.0
    };

    1.0 - (weights.utilization * utilization
        + weights.compaction * compaction
        + weights.free_strip * strip)
}

fn utilization_term(container: &Container, size: ContainerSize, is_last: bool) -> f64 {
    if container.is_empty() {
        return 1.0;
    }

    let placed = container.placed_area();
    let denominator = if is_last {
        match envelope(&container.placed_points()) {
            Some((min_x, min_y, max_x, max_y)) => (max_x - min_x) * (max_y - min_y),
            None => 0.0,
        }
    } else {
        size.area()
    };

    if denominator <= 0.0 {
        return 1.0;
    }
    1.0 - placed / denominator
}

fn compaction_term(container: &Container) -> f64 {
    if container.is_empty() {
        return 1.0;
    }

    let hull = convex_hull_area(&container.placed_points());
    if hull <= 0.0 {
        return 1.0;
    }
    1.0 - container.placed_area() / hull
}

/// Area of the full-width band above the highest placement.
fn free_strip(container: &Container, size: ContainerSize) -> f64 {
    let top = container
        .placed_points()
        .iter()
        .map(|p| p.1)
        .fold(f64::NEG_INFINITY, f64::max);
    if top.is_finite() {
        (size.height - top).max(0.0) * size.width
    } else {
        size.area()
    }
}

fn free_strip_term(containers: &[Container], size: ContainerSize) -> f64 {
    let bin_area = size.area();
    let best = containers
        .iter()
        .map(|c| free_strip(c, size))
        .fold(0.0, f64::max);
    (bin_area - best) / bin_area
}
