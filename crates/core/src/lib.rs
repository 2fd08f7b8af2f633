//! # polynest core
//!
//! Shared types for the polynest bin-nesting engine.
//!
//! This crate holds everything that does not depend on polygon geometry:
//!
//! - **Errors**: [`Error`] and the [`Result`] alias
//! - **Configuration**: [`Config`], [`Strategy`], [`SortStrategy`]
//! - **Optimizer contract**: [`Optimizer`], implemented by every heuristic
//! - **Simulated annealing primitives**: [`SaConfig`], [`metropolis_accept`],
//!   [`TemperatureSchedule`], [`SaStats`]
//! - **Run summary**: [`SolveSummary`]
//! - **Robust predicates**: exact orientation tests used by the geometry kernel
//!
//! ## Strategies
//!
//! | Strategy | Speed | Quality | Description |
//! |----------|-------|---------|-------------|
//! | `Initial` | Fast | Basic | Identity orientation, last container only |
//! | `Greedy` | Medium | Good | 8 orientations x all containers, fitness-ranked |
//! | `SimulatedAnnealing` | Slow | High | Swap moves with Metropolis acceptance |
//!
//! ```rust
//! use polynest_core::{Config, SaConfig, SortStrategy, Strategy};
//!
//! let config = Config::new()
//!     .with_strategy(Strategy::SimulatedAnnealing)
//!     .with_sort(SortStrategy::DecreasingArea)
//!     .with_sa(SaConfig::from_params(0.5, 0.001))
//!     .with_seed(42);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod result;
pub mod robust;
pub mod sa;
pub mod solver;

// Re-exports
pub use error::{Error, Result};
pub use result::SolveSummary;
pub use sa::{metropolis_accept, SaConfig, SaStats, TemperatureSchedule};
pub use solver::{Config, Optimizer, SortStrategy, Strategy};
