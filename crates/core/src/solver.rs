//! Solver traits and configuration.

use crate::result::SolveSummary;
use crate::sa::SaConfig;
use crate::{Error, Result};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nesting strategy (the `mode` of a run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Fast greedy: identity orientation, last container only.
    #[default]
    Initial,
    /// Full greedy: every orientation against every container, fitness-ranked.
    Greedy,
    /// Swap-move simulated annealing on top of an initial nesting.
    SimulatedAnnealing,
}

impl Strategy {
    /// Returns a human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Greedy => "greedy",
            Self::SimulatedAnnealing => "simulated annealing",
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "initial" | "fast" | "fast greedy" => Ok(Self::Initial),
            "greedy" | "full greedy" => Ok(Self::Greedy),
            "simulated annealing" | "sa" => Ok(Self::SimulatedAnnealing),
            other => Err(Error::ConfigError(format!("Unknown strategy '{}'", other))),
        }
    }
}

/// Order in which pending shapes are nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortStrategy {
    /// Random draw without replacement among shapes with remaining demand.
    Random,
    /// Largest area first.
    #[default]
    DecreasingArea,
}

impl FromStr for SortStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "descending area" | "decreasing area" | "decreasing-area" => Ok(Self::DecreasingArea),
            other => Err(Error::ConfigError(format!(
                "Unknown sort strategy '{}'",
                other
            ))),
        }
    }
}

/// Configuration of a nesting run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Nesting strategy.
    pub strategy: Strategy,

    /// Order in which shapes are drawn.
    pub sort: SortStrategy,

    /// RNG seed (None = seeded from entropy).
    pub seed: Option<u64>,

    /// Number of threads for parallel evaluation (0 = rayon's global pool).
    pub threads: usize,

    /// Simulated annealing parameters (only read by `Strategy::SimulatedAnnealing`).
    pub sa: SaConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nesting strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the sort strategy.
    pub fn with_sort(mut self, sort: SortStrategy) -> Self {
        self.sort = sort;
        self
    }

    /// Fixes the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the simulated annealing parameters.
    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.strategy == Strategy::SimulatedAnnealing {
            self.sa.validate()?;
        }
        Ok(())
    }
}

/// A packing optimization strategy.
///
/// Every heuristic (greedy placers, simulated annealing) implements this
/// contract so the packing state stays decoupled from the algorithm used.
pub trait Optimizer {
    /// The state being optimized.
    type State;
    /// Per-run context (caches, random source).
    type Context;

    /// Returns the strategy name used in summaries and logs.
    fn name(&self) -> &'static str;

    /// Optimizes the state in place.
    fn optimize(&self, state: &mut Self::State, ctx: &mut Self::Context) -> Result<SolveSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("initial".parse::<Strategy>().unwrap(), Strategy::Initial);
        assert_eq!("Greedy".parse::<Strategy>().unwrap(), Strategy::Greedy);
        assert_eq!(
            "simulated annealing".parse::<Strategy>().unwrap(),
            Strategy::SimulatedAnnealing
        );
        assert!("genetic".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!("random".parse::<SortStrategy>().unwrap(), SortStrategy::Random);
        assert_eq!(
            "descending area".parse::<SortStrategy>().unwrap(),
            SortStrategy::DecreasingArea
        );
        assert!("alphabetical".parse::<SortStrategy>().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_strategy(Strategy::Greedy)
            .with_sort(SortStrategy::Random)
            .with_seed(7)
            .with_threads(2);

        assert_eq!(config.strategy, Strategy::Greedy);
        assert_eq!(config.sort, SortStrategy::Random);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.threads, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validates_sa_only_when_selected() {
        let bad_sa = SaConfig::default().with_cooling_rate(0.0);

        let greedy = Config::new().with_sa(bad_sa.clone());
        assert!(greedy.validate().is_ok());

        let sa = Config::new()
            .with_strategy(Strategy::SimulatedAnnealing)
            .with_sa(bad_sa);
        assert!(sa.validate().is_err());
    }
}
