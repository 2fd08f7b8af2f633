//! Robust orientation predicates.
//!
//! Orientation tests decide convexity, winding order and ear validity
//! during decomposition. Snapped, near-integer coordinates produce many
//! exactly collinear triples, so the sign must be exact: this module wraps
//! Shewchuk's adaptive-precision `orient2d` from the `robust` crate.

use robust::{orient2d as robust_orient2d, Coord};

/// Turn direction of three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Counter-clockwise (left turn).
    Left,
    /// Clockwise (right turn).
    Right,
    /// Collinear.
    Straight,
}

impl Turn {
    /// Returns true for a left (counter-clockwise) turn.
    #[inline]
    pub fn is_left(self) -> bool {
        matches!(self, Turn::Left)
    }

    /// Returns true for a right (clockwise) turn.
    #[inline]
    pub fn is_right(self) -> bool {
        matches!(self, Turn::Right)
    }

    /// Returns true if the points are collinear.
    #[inline]
    pub fn is_straight(self) -> bool {
        matches!(self, Turn::Straight)
    }
}

/// Exact turn direction of `pc` relative to the directed line `pa -> pb`.
///
/// ```rust
/// use polynest_core::robust::{orient2d, Turn};
///
/// assert_eq!(orient2d((0.0, 0.0), (1.0, 0.0), (0.5, 1.0)), Turn::Left);
/// assert_eq!(orient2d((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)), Turn::Straight);
/// ```
#[inline]
pub fn orient2d(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Turn {
    let det = robust_orient2d(
        Coord { x: pa.0, y: pa.1 },
        Coord { x: pb.0, y: pb.1 },
        Coord { x: pc.0, y: pc.1 },
    );

    if det > 0.0 {
        Turn::Left
    } else if det < 0.0 {
        Turn::Right
    } else {
        Turn::Straight
    }
}

/// Checks if a polygon is convex. Collinear vertices are ignored.
pub fn is_convex(polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut expected: Option<Turn> = None;
    for i in 0..n {
        let turn = orient2d(polygon[i], polygon[(i + 1) % n], polygon[(i + 2) % n]);
        if turn.is_straight() {
            continue;
        }
        match expected {
            None => expected = Some(turn),
            Some(e) if e != turn => return false,
            _ => {}
        }
    }

    // all-collinear rings have no interior
    expected.is_some()
}

/// Signed area by the shoelace formula (Kahan-compensated).
///
/// Positive for counter-clockwise winding, negative for clockwise.
pub fn signed_area(polygon: &[(f64, f64)]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut c = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let term = polygon[i].0 * polygon[j].1 - polygon[j].0 * polygon[i].1;

        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }

    sum / 2.0
}

/// Returns true if the polygon is wound counter-clockwise.
pub fn is_ccw(polygon: &[(f64, f64)]) -> bool {
    signed_area(polygon) > 0.0
}

/// Checks if `p` lies inside or on the boundary of triangle `abc` (any winding).
pub fn point_in_triangle_inclusive(
    p: (f64, f64),
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
) -> bool {
    let o1 = orient2d(a, b, p);
    let o2 = orient2d(b, c, p);
    let o3 = orient2d(c, a, p);

    let has_left = o1.is_left() || o2.is_left() || o3.is_left();
    let has_right = o1.is_right() || o2.is_right() || o3.is_right();

    !(has_left && has_right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> Vec<(f64, f64)> {
        vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 5.0),
            (5.0, 5.0),
            (5.0, 10.0),
            (0.0, 10.0),
        ]
    }

    #[test]
    fn test_orient2d_basic() {
        let a = (0.0, 0.0);
        let b = (1.0, 0.0);
        let c = (0.5, 1.0);

        assert_eq!(orient2d(a, b, c), Turn::Left);
        assert_eq!(orient2d(a, c, b), Turn::Right);
        assert_eq!(orient2d(a, b, (2.0, 0.0)), Turn::Straight);
    }

    #[test]
    fn test_orient2d_large_coordinates() {
        let a = (1e10, 1e10);
        let b = (1e10 + 1.0, 1e10);
        let c = (1e10 + 0.5, 1e10 + 1.0);

        assert_eq!(orient2d(a, b, c), Turn::Left);
    }

    #[test]
    fn test_is_convex() {
        let square = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(is_convex(&square));

        // collinear midpoint on an edge does not break convexity
        let square_mid = vec![
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ];
        assert!(is_convex(&square_mid));

        assert!(!is_convex(&l_shape()));
        assert!(!is_convex(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
    }

    #[test]
    fn test_signed_area() {
        let ccw = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert_relative_eq!(signed_area(&ccw), 100.0, epsilon = 1e-10);
        assert!(is_ccw(&ccw));

        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert_relative_eq!(signed_area(&cw), -100.0, epsilon = 1e-10);
        assert!(!is_ccw(&cw));

        assert_relative_eq!(signed_area(&l_shape()), 75.0, epsilon = 1e-10);
    }

    #[test]
    fn test_point_in_triangle_inclusive() {
        let a = (0.0, 0.0);
        let b = (10.0, 0.0);
        let c = (5.0, 10.0);

        assert!(point_in_triangle_inclusive((5.0, 3.0), a, b, c));
        assert!(point_in_triangle_inclusive((5.0, 0.0), a, b, c));
        assert!(point_in_triangle_inclusive((0.0, 0.0), a, b, c));
        assert!(!point_in_triangle_inclusive((20.0, 5.0), a, b, c));

        // winding of the triangle does not matter
        assert!(point_in_triangle_inclusive((5.0, 3.0), a, c, b));
    }

    #[test]
    fn test_turn_methods() {
        assert!(Turn::Left.is_left());
        assert!(Turn::Right.is_right());
        assert!(Turn::Straight.is_straight());
        assert!(!Turn::Straight.is_left());
    }
}
