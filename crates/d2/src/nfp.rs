//! No-Fit Polygon (NFP) computation.
//!
//! For a candidate polygon and a partially filled container, the NFP is the
//! union of the Minkowski differences `placed ⊕ (−candidate)` of every
//! placement. A translation on its boundary touches the placed polygons
//! without overlapping them. Clipping that boundary to the container's
//! feasible rectangle yields the candidate positions.
//!
//! ## Algorithm
//!
//! 1. Single NFP per placement (cached by the ordered pair of polygons),
//!    translated by the placement's translation
//! 2. Union of the single NFPs
//! 3. Intersection of every union contour with `[0, W - w] x [0, H - h]`
//! 4. Only clipped vertices lying on the pre-clip contour are kept; the
//!    vertices created by the clip itself are not touching positions

use crate::kernel::{
    intersection, minkowski_difference, snap, snap_point, union, Contour, FillRule, EPS,
};
use crate::packing::{Container, ContainerSize};
use crate::polygon::{canonical_bits, Polygon};
use polynest_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

// ============================================================================
// Minkowski cache
// ============================================================================

/// Thread-safe cache of single NFPs.
///
/// Keyed by the ordered pair `(placed variant, candidate variant)` since
/// `A ⊕ (−B)` and `B ⊕ (−A)` differ. Stored polygons are untranslated. A
/// pair whose difference could not be computed is stored as `None` and
/// fails again without recomputing.
#[derive(Debug, Default)]
pub struct MinkowskiCache {
    cache: RwLock<HashMap<(Polygon, Polygon), Option<Arc<Polygon>>>>,
}

impl MinkowskiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached Minkowski difference or computes and caches it.
    pub fn get_or_compute(&self, placed: &Polygon, candidate: &Polygon) -> Result<Arc<Polygon>> {
        let key = (placed.clone(), candidate.clone());

        {
            let cache = self.cache.read().map_err(|e| {
                Error::Internal(format!("Failed to acquire cache read lock: {}", e))
            })?;
            if let Some(entry) = cache.get(&key) {
                return cached(entry, placed, candidate);
            }
        }

        let computed = minkowski_difference(placed, candidate).map(Arc::new);

        let mut cache = self.cache.write().map_err(|e| {
            Error::Internal(format!("Failed to acquire cache write lock: {}", e))
        })?;
        let entry = cache
            .entry(key)
            .or_insert_with(|| computed.as_ref().ok().cloned());
        match computed {
            Err(e) if entry.is_none() => Err(e),
            _ => cached(entry, placed, candidate),
        }
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the cache.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

fn cached(
    entry: &Option<Arc<Polygon>>,
    placed: &Polygon,
    candidate: &Polygon,
) -> Result<Arc<Polygon>> {
    entry.as_ref().map(Arc::clone).ok_or_else(|| {
        Error::NfpError(format!(
            "Minkowski difference of {}-vertex and {}-vertex polygons previously failed",
            placed.len(),
            candidate.len()
        ))
    })
}

// ============================================================================
// NFP
// ============================================================================

/// Upper corner `(W - w, H - h)` of the rectangle of translations keeping
/// the candidate inside the container, or `None` if it does not fit.
pub fn feasible_rectangle(size: ContainerSize, candidate: &Polygon) -> Option<(f64, f64)> {
    let max_x = snap(size.width - candidate.width());
    let max_y = snap(size.height - candidate.height());
    if max_x < 0.0 || max_y < 0.0 {
        None
    } else {
        Some((max_x, max_y))
    }
}

/// All touching translations of `candidate` inside `container`.
///
/// Returns an empty set when the container holds nothing, when the candidate
/// is larger than the container, or when no touching position survives the
/// clip. A single NFP that cannot be computed makes the whole container
/// infeasible for this candidate.
pub fn find_nfp(
    container: &Container,
    size: ContainerSize,
    candidate: &Polygon,
    cache: &MinkowskiCache,
) -> Vec<(f64, f64)> {
    if container.is_empty() {
        return Vec::new();
    }

    let Some((max_x, max_y)) = feasible_rectangle(size, candidate) else {
        return Vec::new();
    };

    let mut singles: Vec<Contour> = Vec::with_capacity(container.len());
    for placement in container.placements() {
        match cache.get_or_compute(&placement.variant, candidate) {
            Ok(nfp) => {
                let (dx, dy) = placement.translation;
                singles.push(nfp.points().iter().map(|&(x, y)| (x + dx, y + dy)).collect());
            }
            Err(e) => {
                log::warn!("Skipping container for {}-vertex candidate: {}", candidate.len(), e);
                return Vec::new();
            }
        }
    }

    let contours = union(&singles, FillRule::NonZero);

    let degenerate = max_x == 0.0 || max_y == 0.0;
    let rect: Contour = vec![(0.0, 0.0), (max_x, 0.0), (max_x, max_y), (0.0, max_y)];

    let mut seen: HashSet<[u64; 2]> = HashSet::new();
    let mut valid = Vec::new();

    for contour in &contours {
        let clipped: Vec<(f64, f64)> = if degenerate {
            clip_edges(contour, max_x, max_y)
        } else {
            intersection(std::slice::from_ref(contour), std::slice::from_ref(&rect), FillRule::NonZero)
                .into_iter()
                .flatten()
                .collect()
        };

        for p in clipped {
            if on_boundary(p, contour) && seen.insert([canonical_bits(p.0), canonical_bits(p.1)]) {
                valid.push(p);
            }
        }
    }

    valid
}

/// Returns true if `p` lies on an edge or vertex of the closed ring.
///
/// For some edge `e` starting at `s`, `p - s` must be collinear with `e`
/// (perpendicular distance within [`EPS`]) and project inside it:
/// `0 <= dot(e, p - s) <= |e|²`.
pub fn on_boundary(p: (f64, f64), contour: &[(f64, f64)]) -> bool {
    let n = contour.len();
    (0..n).any(|i| {
        let s = contour[i];
        let t = contour[(i + 1) % n];
        let e = (t.0 - s.0, t.1 - s.1);
        let v = (p.0 - s.0, p.1 - s.1);

        let len2 = e.0 * e.0 + e.1 * e.1;
        if len2 == 0.0 {
            return v.0.abs() <= EPS && v.1.abs() <= EPS;
        }
        let len = len2.sqrt();

        let cross = e.0 * v.1 - e.1 * v.0;
        if cross.abs() / len > EPS {
            return false;
        }

        let dot = e.0 * v.0 + e.1 * v.1;
        dot >= -EPS * len && dot <= len2 + EPS * len
    })
}

/// Clips every edge of the ring to the box `[0, max_x] x [0, max_y]`
/// (Liang-Barsky) and returns the clipped endpoints.
///
/// Used when the box has no area and a polygon intersection would be empty.
fn clip_edges(contour: &[(f64, f64)], max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
    let n = contour.len();
    let mut points = Vec::new();
    for i in 0..n {
        if let Some((a, b)) = clip_segment(contour[i], contour[(i + 1) % n], max_x, max_y) {
            points.push(snap_point(a));
            points.push(snap_point(b));
        }
    }
    points
}

fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    max_x: f64,
    max_y: f64,
) -> Option<((f64, f64), (f64, f64))> {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [(-dx, a.0), (dx, max_x - a.0), (-dy, a.1), (dy, max_y - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Picks the lowest point, then the leftmost among equals.
pub fn select_best_point(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    points
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)))
}

/// Best translation of `candidate` in `container`.
///
/// An empty container takes the candidate at the origin if it fits.
pub fn best_position(
    container: &Container,
    size: ContainerSize,
    candidate: &Polygon,
    cache: &MinkowskiCache,
) -> Option<(f64, f64)> {
    if container.is_empty() {
        return size.fits(candidate).then_some((0.0, 0.0));
    }
    select_best_point(&find_nfp(container, size, candidate, cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::Placement;
    use geo::{Area, BooleanOps};

    fn size(w: f64, h: f64) -> ContainerSize {
        ContainerSize::new(w, h).unwrap()
    }

    fn container_with(polygon: Polygon, at: (f64, f64)) -> Container {
        Container::with_placements(vec![Placement::new(polygon.clone(), polygon, at)])
    }

    fn has_point(points: &[(f64, f64)], p: (f64, f64)) -> bool {
        points
            .iter()
            .any(|q| (q.0 - p.0).abs() < 1e-9 && (q.1 - p.1).abs() < 1e-9)
    }

    #[test]
    fn test_feasible_rectangle() {
        let sq = Polygon::square(3.0);
        assert_eq!(feasible_rectangle(size(10.0, 5.0), &sq), Some((7.0, 2.0)));
        assert_eq!(feasible_rectangle(size(3.0, 3.0), &sq), Some((0.0, 0.0)));
        assert_eq!(feasible_rectangle(size(2.0, 10.0), &sq), None);
    }

    #[test]
    fn test_on_boundary() {
        let ring = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert!(on_boundary((1.0, 0.0), &ring));
        assert!(on_boundary((2.0, 2.0), &ring));
        assert!(on_boundary((0.0, 1.5), &ring));
        assert!(!on_boundary((1.0, 1.0), &ring));
        assert!(!on_boundary((3.0, 0.0), &ring));
        assert!(!on_boundary((-0.5, 0.0), &ring));
    }

    #[test]
    fn test_two_unit_squares() {
        let cache = MinkowskiCache::new();
        let sq = Polygon::square(1.0);
        let container = container_with(sq.clone(), (0.0, 0.0));

        let points = find_nfp(&container, size(10.0, 10.0), &sq, &cache);
        assert!(has_point(&points, (1.0, 0.0)));
        assert!(has_point(&points, (0.0, 1.0)));
        assert!(has_point(&points, (1.0, 1.0)));
        // inside the single NFP: overlapping
        assert!(!has_point(&points, (0.0, 0.0)));

        assert_eq!(select_best_point(&points), Some((1.0, 0.0)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_empty_container() {
        let cache = MinkowskiCache::new();
        let sq = Polygon::square(1.0);
        assert!(find_nfp(&Container::new(), size(10.0, 10.0), &sq, &cache).is_empty());
        assert_eq!(
            best_position(&Container::new(), size(10.0, 10.0), &sq, &cache),
            Some((0.0, 0.0))
        );
        assert_eq!(
            best_position(&Container::new(), size(0.5, 10.0), &sq, &cache),
            None
        );
    }

    #[test]
    fn test_candidate_larger_than_container() {
        let cache = MinkowskiCache::new();
        let container = container_with(Polygon::square(1.0), (0.0, 0.0));
        let big = Polygon::rectangle(11.0, 1.0);
        assert!(find_nfp(&container, size(10.0, 10.0), &big, &cache).is_empty());
    }

    #[test]
    fn test_full_container_has_no_position() {
        let cache = MinkowskiCache::new();
        let container = container_with(Polygon::rectangle(10.0, 9.5), (0.0, 0.0));
        let sq = Polygon::square(1.0);
        assert!(find_nfp(&container, size(10.0, 10.0), &sq, &cache).is_empty());
    }

    #[test]
    fn test_degenerate_feasible_rectangle() {
        // candidate spans the full width: only x = 0 is feasible
        let cache = MinkowskiCache::new();
        let strip = Polygon::rectangle(10.0, 1.0);
        let container = container_with(strip.clone(), (0.0, 0.0));

        let points = find_nfp(&container, size(10.0, 10.0), &strip, &cache);
        assert!(has_point(&points, (0.0, 1.0)));
        assert_eq!(select_best_point(&points), Some((0.0, 1.0)));
    }

    #[test]
    fn test_points_do_not_overlap() {
        let cache = MinkowskiCache::new();
        let l = Polygon::l_shape(4.0, 4.0, 2.0, 2.0);
        let container = container_with(l.clone(), (0.0, 0.0));
        let sq = Polygon::square(2.0);

        let points = find_nfp(&container, size(10.0, 10.0), &sq, &cache);
        assert!(!points.is_empty());
        // the notch of the L takes the square exactly
        assert!(has_point(&points, (2.0, 2.0)));

        let placed = l.to_geo_polygon();
        for &(x, y) in &points {
            let candidate = sq.translate(x, y).to_geo_polygon();
            let overlap = placed.intersection(&candidate).unsigned_area();
            assert!(overlap < 1e-6, "overlap {} at ({}, {})", overlap, x, y);
            assert!(x >= 0.0 && y >= 0.0 && x <= 8.0 && y <= 8.0);
        }
    }

    /// Positive area, but its edges run back over each other so no ear exists.
    fn folded_ring() -> Polygon {
        Polygon::new(vec![
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (3.0, 2.0),
            (3.0, 3.0),
            (0.0, 3.0),
            (0.0, 2.0),
            (2.0, 2.0),
            (2.0, 1.0),
            (0.0, 1.0),
        ])
    }

    #[test]
    fn test_failed_minkowski_makes_container_infeasible() {
        let cache = MinkowskiCache::new();
        let container = container_with(folded_ring(), (0.0, 0.0));
        let sq = Polygon::square(1.0);

        assert!(find_nfp(&container, size(10.0, 10.0), &sq, &cache).is_empty());
        assert_eq!(best_position(&container, size(10.0, 10.0), &sq, &cache), None);
    }

    #[test]
    fn test_failed_minkowski_is_cached() {
        let cache = MinkowskiCache::new();
        let folded = folded_ring();
        let sq = Polygon::square(1.0);

        let first = cache.get_or_compute(&folded, &sq);
        assert!(matches!(first, Err(Error::NfpError(_))));
        assert_eq!(cache.len(), 1);

        let second = cache.get_or_compute(&folded, &sq);
        assert!(matches!(second, Err(Error::NfpError(_))));
        assert_eq!(cache.len(), 1);

        // the reverse pair is a separate entry
        let _ = cache.get_or_compute(&sq, &folded);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_select_best_point_tie_break() {
        let points = vec![(3.0, 1.0), (2.0, 0.0), (5.0, 0.0), (0.0, 2.0)];
        assert_eq!(select_best_point(&points), Some((2.0, 0.0)));
        assert_eq!(select_best_point(&[]), None);
    }
}
