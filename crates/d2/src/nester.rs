//! Run driver: builds the per-run context and dispatches to an optimizer.

use crate::greedy::{FastGreedy, FullGreedy};
use crate::nfp::MinkowskiCache;
use crate::packing::Packing;
use crate::sa_nesting::SimulatedAnnealing;
use crate::transform::TransformCache;
use polynest_core::{Config, Optimizer, Result, SolveSummary, Strategy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// State owned by one nesting run: the caches and the random source.
///
/// A fresh context per run keeps cache keys from leaking between runs.
#[derive(Debug)]
pub struct NestContext {
    /// Single-NFP cache.
    pub minkowski: MinkowskiCache,
    /// Orientation-variant cache.
    pub transforms: TransformCache,
    /// Random source for sort draws and annealing moves.
    pub rng: StdRng,
}

impl NestContext {
    /// Creates a context, seeded from entropy when `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            minkowski: MinkowskiCache::new(),
            transforms: TransformCache::new(),
            rng,
        }
    }

    /// Creates a deterministic context.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Empties both caches.
    pub fn reset(&mut self) {
        self.minkowski.clear();
        self.transforms.clear();
    }
}

/// Nests a packing according to a [`Config`].
///
/// ```rust
/// use polynest_d2::{Config, ContainerSize, Nester, Packing, Polygon, Strategy};
///
/// let size = ContainerSize::new(10.0, 10.0).unwrap();
/// let mut packing = Packing::new(size, vec![(Polygon::square(1.0), 4)]).unwrap();
///
/// let nester = Nester::new(Config::new().with_strategy(Strategy::Initial).with_seed(1));
/// let summary = nester.nest_all(&mut packing).unwrap();
///
/// assert_eq!(summary.containers_used, 1);
/// assert!(summary.all_placed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Nester {
    config: Config,
}

impl Nester {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Nests all remaining demand of `packing` in place.
    ///
    /// Fails before touching the packing if the configuration or the fitness
    /// weights are invalid, or if some polygon fits no container.
    pub fn nest_all(&self, packing: &mut Packing) -> Result<SolveSummary> {
        self.config.validate()?;
        packing.weights().validate()?;
        packing.check_geometric_demand()?;

        let mut ctx = NestContext::new(self.config.seed);
        let start = Instant::now();

        log::info!(
            "Nesting {} polygons ({} shapes) with {} ({:?} order), {} containers open",
            packing.total_remaining(),
            packing.available_polygons().len(),
            self.config.strategy.name(),
            self.config.sort,
            packing.containers().len()
        );

        let mut summary = match self.config.strategy {
            Strategy::Initial => FastGreedy::new(self.config.sort).optimize(packing, &mut ctx),
            Strategy::Greedy => FullGreedy::new(self.config.sort)
                .with_threads(self.config.threads)
                .optimize(packing, &mut ctx),
            Strategy::SimulatedAnnealing => {
                SimulatedAnnealing::new(self.config.sort, self.config.sa.clone())
                    .optimize(packing, &mut ctx)
            }
        }?;
        summary.elapsed = start.elapsed();

        log::info!(
            "Nested into {} containers: fitness={:.4}, utilization={}, remaining={}, elapsed={:?}",
            summary.containers_used,
            summary.fitness,
            summary.utilization_percent(),
            summary.remaining,
            summary.elapsed
        );

        Ok(summary)
    }
}
