//! Orientation variants (flip and quarter-turn rotations) and their cache.
//!
//! A transformed polygon is always normalized: its bounding box is anchored
//! at the origin, so the translation of a placement is the position of the
//! variant's bottom-left bounding-box corner.

use crate::kernel::snap_points;
use crate::polygon::Polygon;
use polynest_core::{Error, Result};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rotation restricted to quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// All rotations in ascending angle order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Parses an angle in degrees; only multiples of 90 are accepted.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(Error::ConfigError(format!(
                "Rotation must be a multiple of 90 degrees, got {}",
                degrees
            ))),
        }
    }

    /// Exact `(cos, sin)` of the angle.
    fn cos_sin(self) -> (f64, f64) {
        match self {
            Rotation::Deg0 => (1.0, 0.0),
            Rotation::Deg90 => (0.0, 1.0),
            Rotation::Deg180 => (-1.0, 0.0),
            Rotation::Deg270 => (0.0, -1.0),
        }
    }
}

/// One of the eight orientation variants of a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Orientation {
    /// Mirror about the horizontal axis (negate y) before rotating.
    pub flip: bool,
    /// Counter-clockwise rotation.
    pub rotation: Rotation,
}

impl Orientation {
    /// No flip, no rotation.
    pub const IDENTITY: Orientation = Orientation {
        flip: false,
        rotation: Rotation::Deg0,
    };

    /// The eight variants (2 flips x 4 rotations), identity first.
    pub const ALL: [Orientation; 8] = [
        Orientation::new(false, Rotation::Deg0),
        Orientation::new(false, Rotation::Deg90),
        Orientation::new(false, Rotation::Deg180),
        Orientation::new(false, Rotation::Deg270),
        Orientation::new(true, Rotation::Deg0),
        Orientation::new(true, Rotation::Deg90),
        Orientation::new(true, Rotation::Deg180),
        Orientation::new(true, Rotation::Deg270),
    ];

    pub const fn new(flip: bool, rotation: Rotation) -> Self {
        Self { flip, rotation }
    }

    /// Draws a uniformly random variant.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Applies an orientation to a polygon and normalizes the result.
///
/// Flip negates y, then the rotation matrix is applied. Coordinates are
/// snapped, translated so the minimum x and y are exactly zero, and snapped
/// again. An already-normalized polygon under the identity comes back equal.
pub fn transform(polygon: &Polygon, orientation: Orientation) -> Polygon {
    let (cos, sin) = orientation.rotation.cos_sin();

    let oriented: Vec<(f64, f64)> = polygon
        .points()
        .iter()
        .map(|&(x, y)| {
            let y = if orientation.flip { -y } else { y };
            (x * cos - y * sin, x * sin + y * cos)
        })
        .collect();
    let oriented = snap_points(&oriented);

    let min_x = oriented.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let min_y = oriented.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);

    let shifted: Vec<(f64, f64)> = oriented
        .into_iter()
        .map(|(x, y)| (x - min_x, y - min_y))
        .collect();

    Polygon::new(snap_points(&shifted))
}

/// Thread-safe cache of normalized orientation variants.
///
/// Entries are insert-if-absent; two threads racing on the same key compute
/// the same value, so either write is acceptable.
#[derive(Debug, Default)]
pub struct TransformCache {
    cache: RwLock<HashMap<(Polygon, Orientation), Arc<Polygon>>>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached variant or computes and caches it.
    pub fn get_or_compute(&self, polygon: &Polygon, orientation: Orientation) -> Result<Arc<Polygon>> {
        let key = (polygon.clone(), orientation);

        {
            let cache = self.cache.read().map_err(|e| {
                Error::Internal(format!("Failed to acquire transform cache read lock: {}", e))
            })?;
            if let Some(variant) = cache.get(&key) {
                return Ok(Arc::clone(variant));
            }
        }

        let variant = Arc::new(transform(polygon, orientation));

        let mut cache = self.cache.write().map_err(|e| {
            Error::Internal(format!("Failed to acquire transform cache write lock: {}", e))
        })?;
        Ok(Arc::clone(cache.entry(key).or_insert(variant)))
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

/// Cached [`transform`].
pub fn apply_transformations(
    polygon: &Polygon,
    orientation: Orientation,
    cache: &TransformCache,
) -> Result<Polygon> {
    cache
        .get_or_compute(polygon, orientation)
        .map(|variant| (*variant).clone())
}

/// The distinct normalized variants of a polygon, in [`Orientation::ALL`] order.
///
/// Variants describing the same ring are kept once, so symmetric shapes
/// produce fewer than eight (a square has one).
pub fn distinct_variants(
    polygon: &Polygon,
    cache: &TransformCache,
) -> Result<Vec<(Orientation, Polygon)>> {
    let mut variants: Vec<(Orientation, Polygon)> = Vec::with_capacity(Orientation::ALL.len());
    for orientation in Orientation::ALL {
        let variant = apply_transformations(polygon, orientation, cache)?;
        if !variants.iter().any(|(_, v)| v.same_ring(&variant)) {
            variants.push((orientation, variant));
        }
    }
    Ok(variants)
}
