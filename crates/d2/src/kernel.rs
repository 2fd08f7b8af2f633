//! Geometry kernel: epsilon snapping, Minkowski difference and boolean operations.
//!
//! Boolean operations are delegated to `i_overlay`, which is sensitive to
//! near-degenerate vertices. Every polygon handed to it is snapped first and
//! every contour it returns is snapped again.

use crate::polygon::Polygon;
use geo::{Area, BoundingRect, ConvexHull, Coord, LineString, MultiPoint, Point};
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use polynest_core::robust::{orient2d, point_in_triangle_inclusive};
use polynest_core::{Error, Result};
use std::f64::consts::TAU;

pub use i_overlay::core::fill_rule::FillRule;

/// Snapping tolerance: values within `EPS` of an integer are snapped to it.
pub const EPS: f64 = 1e-6;

/// A closed ring of vertices (no repeated closing vertex).
pub type Contour = Vec<(f64, f64)>;

/// Snaps a value to the nearest integer when within [`EPS`] of it.
#[inline]
pub fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < EPS {
        // r + 0.0 turns -0.0 into 0.0
        r + 0.0
    } else {
        v
    }
}

/// Snaps both coordinates of a point.
#[inline]
pub fn snap_point(p: (f64, f64)) -> (f64, f64) {
    (snap(p.0), snap(p.1))
}

/// Snaps every coordinate of a ring.
pub fn snap_points(points: &[(f64, f64)]) -> Contour {
    points.iter().copied().map(snap_point).collect()
}

/// Returns the ring wound counter-clockwise.
pub fn ensure_ccw(points: &[(f64, f64)]) -> Contour {
    if signed_area(points) < 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    }
}

/// Signed area of a ring.
pub fn signed_area(points: &[(f64, f64)]) -> f64 {
    polynest_core::robust::signed_area(points)
}

// ============================================================================
// Minkowski difference
// ============================================================================

/// Computes `a ⊕ (−b)` as a single outer-boundary polygon.
///
/// The result is the locus of translations of `b` whose interior overlaps
/// `a`; its boundary is the set of touching positions. Both inputs are
/// wound counter-clockwise before the operation.
///
/// Convex inputs chain their angle-sorted edges. Non-convex inputs are
/// decomposed into triangles, pairwise convex sums are unioned, and the
/// largest contour of the union is returned.
pub fn minkowski_difference(a: &Polygon, b: &Polygon) -> Result<Polygon> {
    if a.len() < 3 || b.len() < 3 {
        return Err(Error::NfpError(format!(
            "Minkowski difference needs two polygons, got {} and {} vertices",
            a.len(),
            b.len()
        )));
    }

    let stationary = ensure_ccw(&snap_points(a.points()));
    let reflected = ensure_ccw(&snap_points(b.negate().points()));

    let a_convex = a.is_convex();
    let b_convex = b.is_convex();

    if a_convex && b_convex {
        let sum = minkowski_sum_convex(&stationary, &reflected);
        return Ok(Polygon::new(snap_points(&sum)));
    }

    let parts_a = if a_convex {
        vec![stationary]
    } else {
        triangulate(&stationary)?
    };
    let parts_b = if b_convex {
        vec![reflected]
    } else {
        triangulate(&reflected)?
    };

    let mut partial: Vec<Contour> = Vec::with_capacity(parts_a.len() * parts_b.len());
    for part_a in &parts_a {
        for part_b in &parts_b {
            let sum = minkowski_sum_convex(part_a, part_b);
            if sum.len() >= 3 {
                partial.push(sum);
            }
        }
    }

    // inputs are all counter-clockwise, so NonZero matches the positive rule
    let contours = union(&partial, FillRule::NonZero);

    contours
        .into_iter()
        .max_by(|x, y| signed_area(x).abs().total_cmp(&signed_area(y).abs()))
        .map(|outer| Polygon::new(ensure_ccw(&outer)))
        .ok_or_else(|| Error::NfpError("Union of partial Minkowski sums is empty".into()))
}

/// Minkowski sum of two convex counter-clockwise rings.
///
/// Walked from its bottom-left vertex, a convex ring's edge directions turn
/// monotonically through `[0, 2π)`. The sum's boundary is then both edge
/// walks interleaved by polar angle, started at the sum of the two
/// bottom-left vertices.
fn minkowski_sum_convex(a: &[(f64, f64)], b: &[(f64, f64)]) -> Contour {
    let start_a = lowest_vertex(a);
    let start_b = lowest_vertex(b);

    let mut edges: Vec<(f64, (f64, f64))> = edge_walk(a, start_a)
        .chain(edge_walk(b, start_b))
        .map(|edge| (polar_angle(edge), edge))
        .collect();
    // stable: parallel edges keep `a` first
    edges.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut cursor = (a[start_a].0 + b[start_b].0, a[start_a].1 + b[start_b].1);
    let mut ring = Vec::with_capacity(edges.len());
    for (_, (dx, dy)) in edges {
        ring.push(cursor);
        cursor = (cursor.0 + dx, cursor.1 + dy);
    }
    ring
}

/// Edge vectors of a ring, starting at vertex `start`.
fn edge_walk(ring: &[(f64, f64)], start: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
    let n = ring.len();
    (0..n).map(move |k| {
        let from = ring[(start + k) % n];
        let to = ring[(start + k + 1) % n];
        (to.0 - from.0, to.1 - from.1)
    })
}

/// Index of the lowest vertex, leftmost among equals.
fn lowest_vertex(ring: &[(f64, f64)]) -> usize {
    (0..ring.len())
        .min_by(|&i, &j| {
            ring[i]
                .1
                .total_cmp(&ring[j].1)
                .then(ring[i].0.total_cmp(&ring[j].0))
        })
        .unwrap_or(0)
}

fn polar_angle((dx, dy): (f64, f64)) -> f64 {
    let angle = dy.atan2(dx);
    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

// ============================================================================
// Decomposition
// ============================================================================

/// Ear-clipping triangulation of a simple counter-clockwise ring.
///
/// Collinear vertices are dropped first so every remaining vertex is either
/// convex or reflex.
fn triangulate(polygon: &[(f64, f64)]) -> Result<Vec<Contour>> {
    let mut vertices = remove_collinear(polygon);
    if vertices.len() < 3 {
        return Err(Error::NfpError("Polygon is degenerate".into()));
    }

    let mut triangles = Vec::with_capacity(vertices.len() - 2);

    while vertices.len() > 3 {
        let n = vertices.len();
        let ear = (0..n).find(|&i| is_ear(&vertices, (i + n - 1) % n, i, (i + 1) % n));

        match ear {
            Some(i) => {
                let prev = (i + n - 1) % n;
                let next = (i + 1) % n;
                triangles.push(vec![vertices[prev], vertices[i], vertices[next]]);
                vertices.remove(i);
            }
            None => {
                return Err(Error::NfpError(format!(
                    "No ear found with {} vertices left; polygon is not simple",
                    n
                )))
            }
        }
    }

    triangles.push(vertices);
    Ok(triangles)
}

fn remove_collinear(polygon: &[(f64, f64)]) -> Contour {
    let mut vertices = polygon.to_vec();
    let mut changed = true;
    while changed && vertices.len() >= 3 {
        changed = false;
        let n = vertices.len();
        if let Some(i) = (0..n).find(|&i| {
            orient2d(vertices[(i + n - 1) % n], vertices[i], vertices[(i + 1) % n]).is_straight()
        }) {
            vertices.remove(i);
            changed = true;
        }
    }
    vertices
}

fn is_ear(vertices: &[(f64, f64)], prev: usize, curr: usize, next: usize) -> bool {
    let (a, b, c) = (vertices[prev], vertices[curr], vertices[next]);

    // reflex vertex
    if !orient2d(a, b, c).is_left() {
        return false;
    }

    vertices.iter().enumerate().all(|(i, &p)| {
        i == prev
            || i == curr
            || i == next
            || p == a
            || p == b
            || p == c
            || !point_in_triangle_inclusive(p, a, b, c)
    })
}

// ============================================================================
// Boolean operations
// ============================================================================

fn to_paths(contours: &[Contour]) -> Vec<Vec<[f64; 2]>> {
    contours
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| c.iter().map(|&p| snap_point(p)).map(|(x, y)| [x, y]).collect())
        .collect()
}

fn from_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Contour> {
    shapes
        .into_iter()
        .flatten()
        .filter(|contour| contour.len() >= 3)
        .map(|contour| contour.into_iter().map(|[x, y]| snap_point((x, y))).collect())
        .collect()
}

/// Boolean union of any number of rings.
///
/// Returns every output contour, outer boundaries and holes alike.
pub fn union(contours: &[Contour], fill_rule: FillRule) -> Vec<Contour> {
    let subject = to_paths(contours);
    if subject.is_empty() {
        return Vec::new();
    }
    // overlapping subject contours merge under the fill rule
    let clip: Vec<Vec<[f64; 2]>> = Vec::new();
    from_shapes(subject.overlay(&clip, OverlayRule::Union, fill_rule))
}

/// Boolean intersection of two sets of rings.
pub fn intersection(subject: &[Contour], clip: &[Contour], fill_rule: FillRule) -> Vec<Contour> {
    let subject = to_paths(subject);
    let clip = to_paths(clip);
    if subject.is_empty() || clip.is_empty() {
        return Vec::new();
    }
    from_shapes(subject.overlay(&clip, OverlayRule::Intersect, fill_rule))
}

// ============================================================================
// Hull and envelope
// ============================================================================

/// Area of the convex hull of a point set.
pub fn convex_hull_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let multi: MultiPoint<f64> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
    multi.convex_hull().unsigned_area()
}

/// Bounding envelope of a point set as `(min_x, min_y, max_x, max_y)`.
pub fn envelope(points: &[(f64, f64)]) -> Option<(f64, f64, f64, f64)> {
    let line = LineString::from(
        points
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect::<Vec<_>>(),
    );
    line.bounding_rect()
        .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
}
