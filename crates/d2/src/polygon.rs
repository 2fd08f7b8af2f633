//! Polygon value type.

use geo::{Area, BoundingRect, Coord, LineString, Polygon as GeoPolygon};
use polynest_core::robust;
use polynest_core::{Error, Result};
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A simple polygon: an ordered cycle of vertices without a repeated closing vertex.
///
/// Polygons are immutable values. Two polygons are equal when their vertex
/// sequences are bitwise identical (with `-0.0` folded into `0.0`), which
/// makes them usable as demand-map and cache keys.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    points: Vec<(f64, f64)>,
}

impl Polygon {
    /// Creates a polygon from its vertices.
    ///
    /// A repeated closing vertex is dropped.
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Creates an axis-aligned rectangle anchored at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)])
    }

    /// Creates a square anchored at the origin.
    pub fn square(side: f64) -> Self {
        Self::rectangle(side, side)
    }

    /// Creates an L-shaped polygon anchored at the origin.
    pub fn l_shape(width: f64, height: f64, notch_width: f64, notch_height: f64) -> Self {
        Self::new(vec![
            (0.0, 0.0),
            (width, 0.0),
            (width, notch_height),
            (notch_width, notch_height),
            (notch_width, height),
            (0.0, height),
        ])
    }

    /// Returns the vertices.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Returns the number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area (positive for counter-clockwise winding).
    pub fn signed_area(&self) -> f64 {
        robust::signed_area(&self.points)
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Returns true if the vertices are wound counter-clockwise.
    pub fn is_ccw(&self) -> bool {
        robust::is_ccw(&self.points)
    }

    /// Returns true if the polygon is convex.
    pub fn is_convex(&self) -> bool {
        robust::is_convex(&self.points)
    }

    /// Returns the same polygon wound counter-clockwise.
    pub fn to_ccw(&self) -> Polygon {
        if self.signed_area() < 0.0 {
            Polygon {
                points: self.points.iter().rev().copied().collect(),
            }
        } else {
            self.clone()
        }
    }

    /// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self.to_line_string().bounding_rect() {
            Some(rect) => (rect.min().x, rect.min().y, rect.max().x, rect.max().y),
            None => (0.0, 0.0, 0.0, 0.0),
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        let (min_x, _, max_x, _) = self.bounds();
        max_x - min_x
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        let (_, min_y, _, max_y) = self.bounds();
        max_y - min_y
    }

    /// Returns the polygon translated by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Polygon {
        Polygon {
            points: self.points.iter().map(|&(x, y)| (x + dx, y + dy)).collect(),
        }
    }

    /// Returns the polygon reflected through the origin.
    pub fn negate(&self) -> Polygon {
        Polygon {
            points: self.points.iter().map(|&(x, y)| (-x, -y)).collect(),
        }
    }

    /// Returns true if both polygons describe the same ring, whatever the
    /// starting vertex or traversal direction.
    pub fn same_ring(&self, other: &Polygon) -> bool {
        let n = self.points.len();
        if n != other.points.len() {
            return false;
        }
        if n == 0 {
            return true;
        }

        let same = |a: (f64, f64), b: (f64, f64)| {
            canonical_bits(a.0) == canonical_bits(b.0) && canonical_bits(a.1) == canonical_bits(b.1)
        };

        (0..n).any(|shift| {
            (0..n).all(|i| same(self.points[i], other.points[(i + shift) % n]))
                || (0..n).all(|i| same(self.points[i], other.points[(shift + n - i) % n]))
        })
    }

    /// Validates that the polygon can be nested.
    ///
    /// Rejects fewer than three vertices, non-finite coordinates and zero area.
    /// Self-intersection is not detected.
    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 3 {
            return Err(Error::InvalidGeometry(format!(
                "Polygon must have at least 3 vertices, got {}",
                self.points.len()
            )));
        }

        if self
            .points
            .iter()
            .any(|&(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(Error::InvalidGeometry(
                "Polygon has non-finite coordinates".into(),
            ));
        }

        if self.area() <= 0.0 {
            return Err(Error::InvalidGeometry("Polygon has zero area".into()));
        }

        Ok(())
    }

    fn to_line_string(&self) -> LineString<f64> {
        LineString::from(
            self.points
                .iter()
                .map(|&(x, y)| Coord { x, y })
                .collect::<Vec<_>>(),
        )
    }

    /// Converts to a geo crate Polygon.
    pub fn to_geo_polygon(&self) -> GeoPolygon<f64> {
        GeoPolygon::new(self.to_line_string(), vec![])
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points)
    }
}

/// Bit pattern used for equality and hashing; folds `-0.0` into `0.0`.
#[inline]
pub(crate) fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.points.len() == other.points.len()
            && self.points.iter().zip(&other.points).all(|(a, b)| {
                canonical_bits(a.0) == canonical_bits(b.0)
                    && canonical_bits(a.1) == canonical_bits(b.1)
            })
    }
}

impl Eq for Polygon {}

impl Hash for Polygon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.points.len().hash(state);
        for &(x, y) in &self.points {
            canonical_bits(x).hash(state);
            canonical_bits(y).hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    #[test]
    fn test_rectangle() {
        let rect = Polygon::rectangle(4.0, 2.0);
        assert_eq!(rect.len(), 4);
        assert_relative_eq!(rect.area(), 8.0);
        assert_relative_eq!(rect.width(), 4.0);
        assert_relative_eq!(rect.height(), 2.0);
        assert!(rect.is_ccw());
        assert!(rect.is_convex());
    }

    #[test]
    fn test_closing_vertex_dropped() {
        let p = Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_l_shape_area() {
        let l = Polygon::l_shape(10.0, 10.0, 5.0, 5.0);
        assert_relative_eq!(l.area(), 75.0, epsilon = 1e-10);
        assert!(!l.is_convex());
    }

    #[test]
    fn test_to_ccw() {
        let cw = Polygon::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        assert!(!cw.is_ccw());
        let ccw = cw.to_ccw();
        assert!(ccw.is_ccw());
        assert_relative_eq!(ccw.area(), cw.area());

        // already counter-clockwise: unchanged
        assert_eq!(ccw.to_ccw(), ccw);
    }

    #[test]
    fn test_bounds_and_translate() {
        let t = Polygon::new(vec![(1.0, 2.0), (4.0, 2.0), (2.0, 5.0)]);
        assert_eq!(t.bounds(), (1.0, 2.0, 4.0, 5.0));

        let moved = t.translate(-1.0, -2.0);
        assert_eq!(moved.bounds(), (0.0, 0.0, 3.0, 3.0));
    }

    #[test]
    fn test_validate() {
        assert!(Polygon::square(1.0).validate().is_ok());
        assert!(Polygon::new(vec![(0.0, 0.0), (1.0, 0.0)]).validate().is_err());
        assert!(Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])
            .validate()
            .is_err());
        assert!(Polygon::new(vec![(0.0, 0.0), (f64::NAN, 0.0), (0.0, 1.0)])
            .validate()
            .is_err());
    }

    #[test]
    fn test_same_ring() {
        let a = Polygon::square(1.0);
        let shifted = Polygon::new(vec![(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        let reversed = Polygon::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);

        assert_ne!(a, shifted);
        assert!(a.same_ring(&shifted));
        assert!(a.same_ring(&reversed));
        assert!(!a.same_ring(&Polygon::rectangle(2.0, 1.0)));
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let b = Polygon::new(vec![(-0.0, 0.0), (1.0, -0.0), (0.0, 1.0)]);
        let c = Polygon::new(vec![(1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }
}
