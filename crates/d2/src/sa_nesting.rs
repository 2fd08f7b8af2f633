//! Simulated annealing over swap moves.
//!
//! Starts from a fully nested packing (any remaining demand is nested with
//! the fast greedy first) and repeatedly proposes a swap: two placements,
//! drawn from two containers picked with replacement, trade containers and
//! are re-nested with a fresh random orientation. A swap either applies
//! completely or not at all.
//!
//! The temperature follows [`TemperatureSchedule`]: it drops by the cooling
//! rate on every accepted move and by a fraction of it on every rejected or
//! failed move, so the run length adapts to how often swaps succeed.

use crate::fitness::fitness;
use crate::greedy::FastGreedy;
use crate::nester::NestContext;
use crate::nfp::best_position;
use crate::packing::{Container, ContainerSize, Packing, Placement};
use crate::transform::{apply_transformations, Orientation};
use polynest_core::{
    metropolis_accept, Error, Optimizer, Result, SaConfig, SaStats, SolveSummary, SortStrategy,
    TemperatureSchedule,
};
use rand::Rng;

/// Iterations between progress log lines.
const LOG_INTERVAL: u64 = 1000;

/// Simulated annealing optimizer.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealing {
    sort: SortStrategy,
    config: SaConfig,
}

impl SimulatedAnnealing {
    pub fn new(sort: SortStrategy, config: SaConfig) -> Self {
        Self { sort, config }
    }

    fn iteration_allowed(&self, iterations: u64) -> bool {
        self.config.max_iterations.map_or(true, |cap| iterations < cap)
    }
}

impl Optimizer for SimulatedAnnealing {
    type State = Packing;
    type Context = NestContext;

    fn name(&self) -> &'static str {
        "simulated annealing"
    }

    fn optimize(&self, packing: &mut Packing, ctx: &mut NestContext) -> Result<SolveSummary> {
        self.config.validate()?;
        FastGreedy::new(self.sort).nest_pending(packing, ctx)?;

        let size = packing.size();
        let weights = *packing.weights();
        let mut schedule = TemperatureSchedule::new(&self.config);
        let mut current = packing.fitness();
        let mut stats = SaStats {
            initial_fitness: current,
            ..Default::default()
        };

        while !schedule.is_exhausted() && self.iteration_allowed(stats.iterations) {
            stats.iterations += 1;

            match swap_move(packing.containers(), size, ctx)? {
                Some(candidate) => {
                    let candidate_fitness = fitness(&candidate, size, &weights);
                    let delta = candidate_fitness - current;

                    if metropolis_accept(delta, schedule.temperature(), &mut ctx.rng) {
                        stats.accepted += 1;
                        if delta <= 0.0 {
                            stats.accepted_non_improving += 1;
                        }
                        packing.set_containers(candidate);
                        current = candidate_fitness;
                        stats.history.push(current);
                        schedule.on_accept();
                    } else {
                        stats.rejected += 1;
                        schedule.on_reject();
                    }
                }
                None => {
                    stats.failed_moves += 1;
                    schedule.on_reject();
                }
            }

            if stats.iterations % LOG_INTERVAL == 0 {
                log::debug!(
                    "SA Iteration {}: temp={:.4}, fitness={:.4}",
                    stats.iterations,
                    schedule.temperature(),
                    current
                );
            }
        }

        stats.final_fitness = current;
        stats.final_temperature = schedule.temperature();

        log::debug!(
            "SA finished after {} iterations: accepted={} (non-improving {}), rejected={}, failed={}",
            stats.iterations,
            stats.accepted,
            stats.accepted_non_improving,
            stats.rejected,
            stats.failed_moves
        );

        Ok(packing.summary(self.name()).with_sa_stats(stats))
    }
}

/// Proposes one swap move.
///
/// Works on a copy of `containers`: returns the swapped layout, or `None`
/// when the move fails (an empty container was drawn, the same placement was
/// drawn twice, or a re-nesting found no position).
pub(crate) fn swap_move(
    containers: &[Container],
    size: ContainerSize,
    ctx: &mut NestContext,
) -> Result<Option<Vec<Container>>> {
    if containers.is_empty() {
        return Ok(None);
    }

    let b1 = ctx.rng.gen_range(0..containers.len());
    let b2 = ctx.rng.gen_range(0..containers.len());
    if containers[b1].is_empty() || containers[b2].is_empty() {
        return Ok(None);
    }

    let p1 = ctx.rng.gen_range(0..containers[b1].len());
    let p2 = ctx.rng.gen_range(0..containers[b2].len());
    if b1 == b2 && p1 == p2 {
        return Ok(None);
    }

    let mut trial = containers.to_vec();

    // within one container the higher index goes first
    let (a, b) = if b1 == b2 && p1 < p2 {
        let b = take(&mut trial[b2], p2)?;
        (take(&mut trial[b1], p1)?, b)
    } else {
        let a = take(&mut trial[b1], p1)?;
        (a, take(&mut trial[b2], p2)?)
    };

    if !renest(&mut trial[b2], &a, size, ctx)? || !renest(&mut trial[b1], &b, size, ctx)? {
        return Ok(None);
    }
    Ok(Some(trial))
}

fn take(container: &mut Container, index: usize) -> Result<Placement> {
    container
        .remove(index)
        .ok_or_else(|| Error::Internal(format!("Placement index {} out of range", index)))
}

/// Re-nests `placement` into `container` with a random orientation of its
/// current variant. Returns false if no position exists.
fn renest(
    container: &mut Container,
    placement: &Placement,
    size: ContainerSize,
    ctx: &mut NestContext,
) -> Result<bool> {
    let orientation = Orientation::random(&mut ctx.rng);
    let variant = apply_transformations(&placement.variant, orientation, &ctx.transforms)?;

    match best_position(container, size, &variant, &ctx.minkowski) {
        Some(position) => {
            container.push(Placement::new(placement.source.clone(), variant, position));
            Ok(true)
        }
        None => Ok(false),
    }
}
