//! Packing state: containers, placements and remaining demand.

use crate::fitness::{fitness, FitnessWeights};
use crate::nester::Nester;
use crate::polygon::{canonical_bits, Polygon};
use crate::transform::{transform, Orientation};
use polynest_core::{Config, Error, Result, SaConfig, SolveSummary, SortStrategy, Strategy};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size shared by every container of a packing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    /// Creates a container size, rejecting non-positive or non-finite dimensions.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::InvalidBoundary(format!(
                "Container must have positive dimensions, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns true if the polygon's bounding box fits inside the container.
    pub fn fits(&self, polygon: &Polygon) -> bool {
        polygon.width() <= self.width && polygon.height() <= self.height
    }
}

/// A polygon placed in a container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// The demanded polygon this placement accounts for.
    pub source: Polygon,
    /// The normalized orientation variant actually placed.
    pub variant: Polygon,
    /// Translation applied to the variant.
    pub translation: (f64, f64),
}

impl Placement {
    pub fn new(source: Polygon, variant: Polygon, translation: (f64, f64)) -> Self {
        Self {
            source,
            variant,
            translation,
        }
    }

    /// The variant in container coordinates.
    pub fn placed_polygon(&self) -> Polygon {
        self.variant.translate(self.translation.0, self.translation.1)
    }

    /// Vertices of the variant in container coordinates.
    pub fn placed_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let (dx, dy) = self.translation;
        self.variant.points().iter().map(move |&(x, y)| (x + dx, y + dy))
    }

    pub fn area(&self) -> f64 {
        self.variant.area()
    }
}

/// One container (bin): an ordered list of placements.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    placements: Vec<Placement>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container holding the given placements.
    pub fn with_placements(placements: Vec<Placement>) -> Self {
        Self { placements }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn push(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    /// Removes and returns the placement at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Placement> {
        if index < self.placements.len() {
            Some(self.placements.remove(index))
        } else {
            None
        }
    }

    /// Sum of the placed areas.
    pub fn placed_area(&self) -> f64 {
        self.placements.iter().map(Placement::area).sum()
    }

    /// Every placed vertex in container coordinates.
    pub fn placed_points(&self) -> Vec<(f64, f64)> {
        self.placements
            .iter()
            .flat_map(|p| p.placed_points())
            .collect()
    }
}

/// Hashable canonical form of a layout, used to compare packings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutKey(Vec<Vec<(Polygon, Polygon, [u64; 2])>>);

/// The aggregate nesting state.
///
/// Invariant: for every demanded polygon, the initial demand equals the
/// number of placements with that source plus its remaining demand.
#[derive(Debug, Clone)]
pub struct Packing {
    size: ContainerSize,
    /// Remaining demand in insertion order.
    demand: Vec<(Polygon, usize)>,
    initial: HashMap<Polygon, usize>,
    containers: Vec<Container>,
    weights: FitnessWeights,
}

impl Packing {
    /// Creates an empty packing for the given demand.
    ///
    /// Repeated polygons have their counts merged.
    pub fn new(
        size: ContainerSize,
        demand: impl IntoIterator<Item = (Polygon, usize)>,
    ) -> Result<Self> {
        Self::with_containers(size, demand, Vec::new())
    }

    /// Creates a packing that already holds some containers.
    ///
    /// The initial demand of a polygon is its remaining count plus the
    /// placements already made for it.
    pub fn with_containers(
        size: ContainerSize,
        demand: impl IntoIterator<Item = (Polygon, usize)>,
        containers: Vec<Container>,
    ) -> Result<Self> {
        let mut remaining: Vec<(Polygon, usize)> = Vec::new();
        for (polygon, count) in demand {
            polygon.validate()?;
            match remaining.iter_mut().find(|(p, _)| *p == polygon) {
                Some((_, n)) => *n += count,
                None => remaining.push((polygon, count)),
            }
        }

        let mut initial: HashMap<Polygon, usize> =
            remaining.iter().map(|(p, n)| (p.clone(), *n)).collect();
        for placement in containers.iter().flat_map(|c| c.placements()) {
            placement.variant.validate()?;
            *initial.entry(placement.source.clone()).or_insert(0) += 1;
        }

        Ok(Self {
            size,
            demand: remaining,
            initial,
            containers,
            weights: FitnessWeights::default(),
        })
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn size(&self) -> ContainerSize {
        self.size
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Polygons whose remaining demand is non-zero, in insertion order.
    pub fn available_polygons(&self) -> Vec<&Polygon> {
        self.demand
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(p, _)| p)
            .collect()
    }

    /// Remaining demand entries, including exhausted ones still tracked.
    pub fn demand(&self) -> &[(Polygon, usize)] {
        &self.demand
    }

    /// Remaining demand of a polygon (0 if unknown or exhausted).
    pub fn remaining(&self, polygon: &Polygon) -> usize {
        self.demand
            .iter()
            .find(|(p, _)| p == polygon)
            .map_or(0, |(_, n)| *n)
    }

    /// Total remaining demand.
    pub fn total_remaining(&self) -> usize {
        self.demand.iter().map(|(_, n)| n).sum()
    }

    /// Number of placements whose source is `polygon`.
    pub fn placed_count(&self, polygon: &Polygon) -> usize {
        self.containers
            .iter()
            .flat_map(|c| c.placements())
            .filter(|p| p.source == *polygon)
            .count()
    }

    /// Total number of placements.
    pub fn total_placed(&self) -> usize {
        self.containers.iter().map(Container::len).sum()
    }

    /// Demand of a polygon when the packing was constructed.
    pub fn initial_demand(&self, polygon: &Polygon) -> usize {
        self.initial.get(polygon).copied().unwrap_or(0)
    }

    /// Hashable canonical form of the current layout.
    pub fn layout_key(&self) -> LayoutKey {
        LayoutKey(
            self.containers
                .iter()
                .map(|c| {
                    c.placements()
                        .iter()
                        .map(|p| {
                            (
                                p.source.clone(),
                                p.variant.clone(),
                                [
                                    canonical_bits(p.translation.0),
                                    canonical_bits(p.translation.1),
                                ],
                            )
                        })
                        .collect()
                })
                .collect(),
        )
    }

    /// The `n` most recent placements across containers, oldest first.
    pub fn last_placements(&self, n: usize) -> Vec<&Placement> {
        let all: Vec<&Placement> = self
            .containers
            .iter()
            .flat_map(|c| c.placements())
            .collect();
        let skip = all.len().saturating_sub(n);
        all.into_iter().skip(skip).collect()
    }

    /// Fitness of the current layout.
    pub fn fitness(&self) -> f64 {
        fitness(&self.containers, self.size, &self.weights)
    }

    /// Checks that every polygon with remaining demand fits an empty
    /// container in at least one orientation.
    pub fn check_geometric_demand(&self) -> Result<()> {
        for polygon in self.available_polygons() {
            let fits = Orientation::ALL
                .iter()
                .any(|&o| self.size.fits(&transform(polygon, o)));
            if !fits {
                return Err(ungeometrical(polygon, self.size));
            }
        }
        Ok(())
    }

    /// Nests every remaining polygon.
    ///
    /// `extra` carries the annealing parameters; when `None` the defaults
    /// are used.
    pub fn nest_all(
        &mut self,
        strategy: Strategy,
        sort: SortStrategy,
        extra: Option<SaConfig>,
    ) -> Result<SolveSummary> {
        let config = Config::new()
            .with_strategy(strategy)
            .with_sort(sort)
            .with_sa(extra.unwrap_or_default());
        Nester::new(config).nest_all(self)
    }

    /// Builds a summary of the current layout.
    pub fn summary(&self, strategy: &str) -> SolveSummary {
        let bin_area = self.size.area();
        let container_utilization: Vec<f64> = self
            .containers
            .iter()
            .map(|c| c.placed_area() / bin_area)
            .collect();
        let placed_area: f64 = self.containers.iter().map(Container::placed_area).sum();
        let utilization = if self.containers.is_empty() {
            0.0
        } else {
            placed_area / (bin_area * self.containers.len() as f64)
        };

        SolveSummary {
            containers_used: self.containers.len(),
            placed: self.total_placed(),
            remaining: self.total_remaining(),
            fitness: self.fitness(),
            utilization,
            container_utilization,
            ..SolveSummary::new(strategy)
        }
    }

    pub(crate) fn containers_mut(&mut self) -> &mut Vec<Container> {
        &mut self.containers
    }

    /// Replaces every container at once.
    pub(crate) fn set_containers(&mut self, containers: Vec<Container>) {
        self.containers = containers;
    }

    /// Records one placement of `polygon` against the demand.
    ///
    /// Under random order an exhausted polygon leaves the demand map.
    pub(crate) fn consume(&mut self, polygon: &Polygon, sort: SortStrategy) {
        if let Some(idx) = self.demand.iter().position(|(p, _)| p == polygon) {
            let entry = &mut self.demand[idx];
            entry.1 = entry.1.saturating_sub(1);
            if entry.1 == 0 && sort == SortStrategy::Random {
                self.demand.remove(idx);
            }
        }
    }
}

pub(crate) fn ungeometrical(polygon: &Polygon, size: ContainerSize) -> Error {
    Error::UngeometricalDemand(format!(
        "polygon with {} vertices ({}x{}) fits no {}x{} container in any orientation",
        polygon.len(),
        polygon.width(),
        polygon.height(),
        size.width,
        size.height
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn size() -> ContainerSize {
        ContainerSize::new(10.0, 10.0).unwrap()
    }

    fn square_at(side: f64, x: f64, y: f64) -> Placement {
        let sq = Polygon::square(side);
        Placement::new(sq.clone(), sq, (x, y))
    }

    #[test]
    fn test_container_size_validation() {
        assert!(ContainerSize::new(10.0, 5.0).is_ok());
        assert!(matches!(
            ContainerSize::new(0.0, 5.0),
            Err(Error::InvalidBoundary(_))
        ));
        assert!(ContainerSize::new(10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_fits() {
        let s = ContainerSize::new(10.0, 5.0).unwrap();
        assert!(s.fits(&Polygon::rectangle(10.0, 5.0)));
        assert!(!s.fits(&Polygon::rectangle(5.0, 10.0)));
    }

    #[test]
    fn test_new_merges_and_validates() {
        let sq = Polygon::square(1.0);
        let packing = Packing::new(size(), vec![(sq.clone(), 2), (sq.clone(), 3)]).unwrap();
        assert_eq!(packing.remaining(&sq), 5);
        assert_eq!(packing.initial_demand(&sq), 5);
        assert_eq!(packing.available_polygons().len(), 1);

        let degenerate = Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(Packing::new(size(), vec![(degenerate, 1)]).is_err());
    }

    #[test]
    fn test_with_containers_accounts_existing_placements() {
        let sq = Polygon::square(1.0);
        let container = Container::with_placements(vec![square_at(1.0, 0.0, 0.0)]);
        let packing = Packing::with_containers(size(), vec![(sq.clone(), 2)], vec![container]).unwrap();

        assert_eq!(packing.initial_demand(&sq), 3);
        assert_eq!(packing.placed_count(&sq), 1);
        assert_eq!(packing.remaining(&sq), 2);
    }

    #[test]
    fn test_consume_random_removes_exhausted() {
        let sq = Polygon::square(1.0);
        let tri = Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let mut packing = Packing::new(size(), vec![(sq.clone(), 1), (tri.clone(), 1)]).unwrap();

        packing.consume(&sq, SortStrategy::DecreasingArea);
        assert_eq!(packing.demand().len(), 2);
        assert_eq!(packing.available_polygons(), vec![&tri]);

        packing.consume(&tri, SortStrategy::Random);
        assert_eq!(packing.demand().len(), 1);
        assert_eq!(packing.total_remaining(), 0);
    }

    #[test]
    fn test_last_placements() {
        let containers = vec![
            Container::with_placements(vec![square_at(1.0, 0.0, 0.0), square_at(1.0, 1.0, 0.0)]),
            Container::with_placements(vec![square_at(1.0, 0.0, 0.0)]),
        ];
        let packing = Packing::with_containers(size(), Vec::new(), containers).unwrap();

        let last = packing.last_placements(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].translation, (1.0, 0.0));
        assert_eq!(last[1].translation, (0.0, 0.0));
        assert_eq!(packing.last_placements(10).len(), 3);
    }

    #[test]
    fn test_layout_key() {
        let a = Packing::with_containers(
            size(),
            Vec::new(),
            vec![Container::with_placements(vec![square_at(1.0, 0.0, 0.0)])],
        )
        .unwrap();
        let b = Packing::with_containers(
            size(),
            Vec::new(),
            vec![Container::with_placements(vec![square_at(1.0, -0.0, 0.0)])],
        )
        .unwrap();
        let c = Packing::with_containers(
            size(),
            Vec::new(),
            vec![Container::with_placements(vec![square_at(1.0, 1.0, 0.0)])],
        )
        .unwrap();

        assert_eq!(a.layout_key(), b.layout_key());
        assert_ne!(a.layout_key(), c.layout_key());
    }

    #[test]
    fn test_check_geometric_demand() {
        let tall = Polygon::rectangle(2.0, 12.0);
        let packing = Packing::new(ContainerSize::new(15.0, 5.0).unwrap(), vec![(tall, 1)]).unwrap();
        // fits once rotated
        assert!(packing.check_geometric_demand().is_ok());

        let huge = Polygon::square(20.0);
        let packing = Packing::new(size(), vec![(huge, 1)]).unwrap();
        assert!(matches!(
            packing.check_geometric_demand(),
            Err(Error::UngeometricalDemand(_))
        ));
    }

    #[test]
    fn test_summary() {
        let containers = vec![Container::with_placements(vec![
            square_at(2.0, 0.0, 0.0),
            square_at(2.0, 2.0, 0.0),
        ])];
        let packing = Packing::with_containers(size(), Vec::new(), containers).unwrap();
        let summary = packing.summary("initial");

        assert_eq!(summary.containers_used, 1);
        assert_eq!(summary.placed, 2);
        assert_eq!(summary.remaining, 0);
        assert_relative_eq!(summary.utilization, 0.08, epsilon = 1e-12);
        assert_eq!(summary.container_utilization.len(), 1);
    }
}
