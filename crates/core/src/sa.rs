//! Simulated annealing primitives.
//!
//! The annealing loop itself lives with the packing state (it needs the NFP
//! engine to build swap moves); this module owns the pieces that do not:
//! the parameters, the Metropolis acceptance rule and the adaptive
//! temperature schedule.
//!
//! The schedule is driven by move outcomes rather than by iteration count:
//! every accepted move lowers the temperature by the cooling rate, every
//! rejected or infeasible move lowers it by `cooling_rate * rejection_ratio`.

use crate::{Error, Result};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for simulated annealing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaConfig {
    /// Initial temperature.
    pub initial_temp: f64,
    /// Temperature decrement applied on every accepted move.
    pub cooling_rate: f64,
    /// Fraction of the cooling rate applied on rejected or failed moves.
    pub rejection_ratio: f64,
    /// Maximum number of proposed moves (None = temperature-based stopping only).
    pub max_iterations: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temp: 1.0,
            cooling_rate: 0.001,
            rejection_ratio: 0.1,
            max_iterations: Some(100_000),
        }
    }
}

impl SaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from the `(initial temperature, cooling rate)`
    /// pair that callers pass as extra algorithm parameters.
    pub fn from_params(initial_temp: f64, cooling_rate: f64) -> Self {
        Self::default()
            .with_initial_temp(initial_temp)
            .with_cooling_rate(cooling_rate)
    }

    /// Sets the initial temperature.
    pub fn with_initial_temp(mut self, temp: f64) -> Self {
        self.initial_temp = temp;
        self
    }

    /// Sets the temperature decrement per accepted move.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    /// Sets the fraction of the cooling rate applied on rejections.
    pub fn with_rejection_ratio(mut self, ratio: f64) -> Self {
        self.rejection_ratio = ratio;
        self
    }

    /// Sets the maximum number of proposed moves.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Removes the iteration cap; the run ends only when the temperature is exhausted.
    pub fn without_iteration_cap(mut self) -> Self {
        self.max_iterations = None;
        self
    }

    /// Validates the parameters.
    ///
    /// A non-positive cooling rate or rejection ratio would never exhaust
    /// the temperature, so both are rejected.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_temp.is_finite() {
            return Err(Error::ConfigError(format!(
                "Initial temperature must be finite, got {}",
                self.initial_temp
            )));
        }
        if !(self.cooling_rate.is_finite() && self.cooling_rate > 0.0) {
            return Err(Error::ConfigError(format!(
                "Cooling rate must be positive, got {}",
                self.cooling_rate
            )));
        }
        if !(self.rejection_ratio > 0.0 && self.rejection_ratio <= 1.0) {
            return Err(Error::ConfigError(format!(
                "Rejection ratio must be in (0, 1], got {}",
                self.rejection_ratio
            )));
        }
        Ok(())
    }
}

/// Metropolis criterion on a maximized fitness.
///
/// Non-decreasing moves are always accepted; a move losing `delta` fitness
/// is accepted with probability `exp(delta / temperature)`.
pub fn metropolis_accept<R: Rng>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta >= 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let probability = (delta / temperature).exp();
    rng.gen::<f64>() < probability
}

/// Adaptive linear temperature schedule.
#[derive(Debug, Clone)]
pub struct TemperatureSchedule {
    temperature: f64,
    cooling_rate: f64,
    rejection_ratio: f64,
}

impl TemperatureSchedule {
    /// Creates a schedule starting at the configured initial temperature.
    pub fn new(config: &SaConfig) -> Self {
        Self {
            temperature: config.initial_temp,
            cooling_rate: config.cooling_rate,
            rejection_ratio: config.rejection_ratio,
        }
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Returns true once the temperature has reached zero or below.
    pub fn is_exhausted(&self) -> bool {
        self.temperature <= 0.0
    }

    /// Cools after an accepted move.
    pub fn on_accept(&mut self) {
        self.temperature -= self.cooling_rate;
    }

    /// Cools after a rejected or infeasible move.
    pub fn on_reject(&mut self) {
        self.temperature -= self.cooling_rate * self.rejection_ratio;
    }
}

/// Statistics of a simulated annealing run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaStats {
    /// Number of proposed moves.
    pub iterations: u64,
    /// Accepted moves.
    pub accepted: u64,
    /// Accepted moves that did not improve the fitness.
    pub accepted_non_improving: u64,
    /// Feasible moves rejected by the Metropolis criterion.
    pub rejected: u64,
    /// Moves where at least one re-nesting found no valid position.
    pub failed_moves: u64,
    /// Fitness of the packing the annealing started from.
    pub initial_fitness: f64,
    /// Fitness of the final packing.
    pub final_fitness: f64,
    /// Temperature when the run stopped.
    pub final_temperature: f64,
    /// Fitness after every accepted move.
    pub history: Vec<f64>,
}

impl SaStats {
    /// Returns the acceptance rate among proposed moves.
    pub fn acceptance_rate(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.accepted as f64 / self.iterations as f64
        }
    }
}
