//! # Polynest 2D
//!
//! Irregular polygon nesting into identical rectangular containers.
//!
//! Placement is driven by No-Fit Polygons: for a candidate shape, the union
//! of its NFPs against everything already placed, clipped to the container,
//! gives the set of touching positions, and the lowest (then leftmost) one
//! is taken.
//!
//! ## Features
//!
//! - Minkowski-difference NFPs for convex and non-convex polygons
//! - Eight orientations per shape (four quarter turns, with and without a flip)
//! - Fast greedy, full greedy (parallel with rayon) and simulated annealing
//! - Weighted fitness combining utilization, compaction and free strip
//! - Per-run caches for NFPs and orientation variants
//!
//! ## Quick Start
//!
//! ```rust
//! use polynest_d2::{ContainerSize, Packing, Polygon, SortStrategy, Strategy};
//!
//! let size = ContainerSize::new(10.0, 10.0).unwrap();
//! let demand = vec![
//!     (Polygon::rectangle(4.0, 2.0), 3),
//!     (Polygon::l_shape(3.0, 3.0, 1.0, 1.0), 2),
//! ];
//! let mut packing = Packing::new(size, demand).unwrap();
//!
//! let summary = packing
//!     .nest_all(Strategy::Greedy, SortStrategy::DecreasingArea, None)
//!     .unwrap();
//!
//! assert!(summary.all_placed());
//! println!("{} containers, utilization {}",
//!     summary.containers_used,
//!     summary.utilization_percent());
//! ```
//!
//! ## Annealing
//!
//! ```rust
//! use polynest_d2::{Config, ContainerSize, Nester, Packing, Polygon, SaConfig, Strategy};
//!
//! let size = ContainerSize::new(10.0, 10.0).unwrap();
//! let mut packing = Packing::new(size, vec![(Polygon::square(2.0), 6)]).unwrap();
//!
//! let config = Config::new()
//!     .with_strategy(Strategy::SimulatedAnnealing)
//!     .with_seed(42)
//!     .with_sa(SaConfig::from_params(0.5, 0.01));
//!
//! let summary = Nester::new(config).nest_all(&mut packing).unwrap();
//! let stats = summary.sa.unwrap();
//! assert_eq!(stats.history.len() as u64, stats.accepted);
//! ```

pub mod fitness;
pub mod greedy;
pub mod kernel;
pub mod nester;
pub mod nfp;
pub mod packing;
pub mod polygon;
pub mod sa_nesting;
pub mod transform;

pub use fitness::{fitness, FitnessWeights};
pub use greedy::{FastGreedy, FullGreedy};
pub use kernel::minkowski_difference;
pub use nester::{NestContext, Nester};
pub use nfp::{best_position, find_nfp, select_best_point, MinkowskiCache};
pub use packing::{Container, ContainerSize, LayoutKey, Packing, Placement};
pub use polygon::Polygon;
pub use sa_nesting::SimulatedAnnealing;
pub use transform::{
    apply_transformations, distinct_variants, transform, Orientation, Rotation, TransformCache,
};
pub use polynest_core::{
    metropolis_accept, Config, Error, Optimizer, Result, SaConfig, SaStats, SolveSummary,
    SortStrategy, Strategy, TemperatureSchedule,
};
