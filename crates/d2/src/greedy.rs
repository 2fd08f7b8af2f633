//! Greedy placers.
//!
//! Both placers consume the pending demand one polygon at a time, in random
//! or decreasing-area order, and never backtrack:
//!
//! - [`FastGreedy`] tries the identity variant against the last container only
//! - [`FullGreedy`] tries every distinct variant against every container and
//!   keeps the placement whose resulting layout scores best
//!
//! Either one opens a new container only when nothing else fits.

use crate::fitness::fitness;
use crate::nester::NestContext;
use crate::nfp::best_position;
use crate::packing::{ungeometrical, Container, Packing, Placement};
use crate::polygon::Polygon;
use crate::transform::{apply_transformations, distinct_variants, Orientation};
use polynest_core::{Error, Optimizer, Result, SolveSummary, SortStrategy};
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Calls `step` once per pending unit of demand, in sort order, and
/// records each placement against the demand after the step succeeds.
pub(crate) fn for_each_pending<F>(
    packing: &mut Packing,
    sort: SortStrategy,
    ctx: &mut NestContext,
    mut step: F,
) -> Result<()>
where
    F: FnMut(&mut Packing, &Polygon, &mut NestContext) -> Result<()>,
{
    match sort {
        SortStrategy::Random => loop {
            let polygon = match packing.available_polygons().choose(&mut ctx.rng) {
                Some(&p) => p.clone(),
                None => break,
            };
            step(packing, &polygon, ctx)?;
            packing.consume(&polygon, sort);
        },
        SortStrategy::DecreasingArea => {
            let mut order: Vec<(Polygon, usize)> = packing
                .demand()
                .iter()
                .filter(|(_, n)| *n > 0)
                .cloned()
                .collect();
            // stable: equal areas keep insertion order
            order.sort_by(|a, b| b.0.area().total_cmp(&a.0.area()));

            for (polygon, count) in order {
                for _ in 0..count {
                    step(packing, &polygon, ctx)?;
                    packing.consume(&polygon, sort);
                }
            }
        }
    }
    Ok(())
}

/// Opens a new container holding `polygon` at the origin.
///
/// Orientations are tried in [`Orientation::ALL`] order; the first whose
/// bounding box fits is used.
pub(crate) fn open_container(
    packing: &mut Packing,
    polygon: &Polygon,
    ctx: &NestContext,
) -> Result<()> {
    let size = packing.size();
    for orientation in Orientation::ALL {
        let variant = apply_transformations(polygon, orientation, &ctx.transforms)?;
        if size.fits(&variant) {
            packing
                .containers_mut()
                .push(Container::with_placements(vec![Placement::new(
                    polygon.clone(),
                    variant,
                    (0.0, 0.0),
                )]));
            log::debug!(
                "Opened container #{} for {}-vertex polygon",
                packing.containers().len(),
                polygon.len()
            );
            return Ok(());
        }
    }
    Err(ungeometrical(polygon, size))
}

// ============================================================================
// Fast greedy
// ============================================================================

/// Identity variant, last container only.
#[derive(Debug, Clone, Default)]
pub struct FastGreedy {
    sort: SortStrategy,
}

impl FastGreedy {
    pub fn new(sort: SortStrategy) -> Self {
        Self { sort }
    }

    /// Places every pending polygon.
    pub fn nest_pending(&self, packing: &mut Packing, ctx: &mut NestContext) -> Result<()> {
        for_each_pending(packing, self.sort, ctx, |packing, polygon, ctx| {
            Self::step(packing, polygon, ctx)
        })
    }

    fn step(packing: &mut Packing, polygon: &Polygon, ctx: &mut NestContext) -> Result<()> {
        let variant = apply_transformations(polygon, Orientation::IDENTITY, &ctx.transforms)?;
        let size = packing.size();

        let position = packing
            .containers()
            .last()
            .and_then(|last| best_position(last, size, &variant, &ctx.minkowski));

        if let Some(position) = position {
            if let Some(last) = packing.containers_mut().last_mut() {
                last.push(Placement::new(polygon.clone(), variant, position));
                return Ok(());
            }
        }
        open_container(packing, polygon, ctx)
    }
}

impl Optimizer for FastGreedy {
    type State = Packing;
    type Context = NestContext;

    fn name(&self) -> &'static str {
        "initial"
    }

    fn optimize(&self, packing: &mut Packing, ctx: &mut NestContext) -> Result<SolveSummary> {
        self.nest_pending(packing, ctx)?;
        Ok(packing.summary(self.name()))
    }
}

// ============================================================================
// Full greedy
// ============================================================================

/// Every distinct variant against every container, ranked by fitness.
#[derive(Debug, Clone, Default)]
pub struct FullGreedy {
    sort: SortStrategy,
    threads: usize,
}

/// A feasible (container, variant) choice and the fitness it leads to.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    fitness: f64,
    position: (f64, f64),
    container: usize,
    variant: usize,
}

/// Higher fitness first, then lower y, lower x, earlier container, earlier variant.
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.fitness
        .total_cmp(&a.fitness)
        .then(a.position.1.total_cmp(&b.position.1))
        .then(a.position.0.total_cmp(&b.position.0))
        .then(a.container.cmp(&b.container))
        .then(a.variant.cmp(&b.variant))
}

impl FullGreedy {
    pub fn new(sort: SortStrategy) -> Self {
        Self { sort, threads: 0 }
    }

    /// Sets the number of worker threads (0 = rayon's global pool).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    fn step(
        packing: &mut Packing,
        polygon: &Polygon,
        ctx: &NestContext,
        pool: Option<&rayon::ThreadPool>,
    ) -> Result<()> {
        let variants = distinct_variants(polygon, &ctx.transforms)?;
        let size = packing.size();
        let weights = *packing.weights();
        let containers = packing.containers();
        let cache = &ctx.minkowski;

        let pairs: Vec<(usize, usize)> = (0..containers.len())
            .flat_map(|c| (0..variants.len()).map(move |v| (c, v)))
            .collect();

        // each worker scores its own copy of the containers
        let evaluate = || {
            pairs
                .par_iter()
                .filter_map(|&(ci, vi)| {
                    let variant = &variants[vi].1;
                    let position = best_position(&containers[ci], size, variant, cache)?;
                    let mut trial = containers.to_vec();
                    trial[ci].push(Placement::new(polygon.clone(), variant.clone(), position));
                    Some(Candidate {
                        fitness: fitness(&trial, size, &weights),
                        position,
                        container: ci,
                        variant: vi,
                    })
                })
                .collect::<Vec<_>>()
        };

        let candidates = match pool {
            Some(pool) => pool.install(evaluate),
            None => evaluate(),
        };

        match candidates.into_iter().min_by(rank) {
            Some(best) => {
                let variant = variants[best.variant].1.clone();
                let container = packing
                    .containers_mut()
                    .get_mut(best.container)
                    .ok_or_else(|| Error::Internal("Container index out of range".into()))?;
                container.push(Placement::new(polygon.clone(), variant, best.position));
                Ok(())
            }
            None => open_container(packing, polygon, ctx),
        }
    }
}

impl Optimizer for FullGreedy {
    type State = Packing;
    type Context = NestContext;

    fn name(&self) -> &'static str {
        "greedy"
    }

    fn optimize(&self, packing: &mut Packing, ctx: &mut NestContext) -> Result<SolveSummary> {
        let pool = if self.threads > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.threads)
                    .build()
                    .map_err(|e| Error::Internal(format!("Failed to build thread pool: {}", e)))?,
            )
        } else {
            None
        };

        for_each_pending(packing, self.sort, ctx, |packing, polygon, ctx| {
            Self::step(packing, polygon, ctx, pool.as_ref())
        })?;
        Ok(packing.summary(self.name()))
    }
}
