//! Planar point-in-polygon over (latitude, longitude) pairs.
//!
//! Coordinates are used as-is without projection, which is accurate enough
//! over a single city.

use serde::{Deserialize, Serialize};

// ---

/// Tolerance used for the on-edge test.
const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Simple ring, implicitly closed. A repeated closing vertex is harmless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    ring: Vec<Coordinate>,
}

impl Polygon {
    pub fn new(ring: Vec<Coordinate>) -> Self {
        Self { ring }
    }

    /// Build from a GeoJSON ring of `[longitude, latitude, ...]` positions.
    ///
    /// Returns `None` when a position has fewer than two numbers or the ring
    /// has fewer than three vertices.
    pub fn from_geojson_ring(ring: &[Vec<f64>]) -> Option<Self> {
        // ---
        let coordinates = ring
            .iter()
            .map(|position| match position.as_slice() {
                [longitude, latitude, ..] => Some(Coordinate::new(*latitude, *longitude)),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        if coordinates.len() < 3 {
            return None;
        }
        Some(Self::new(coordinates))
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.ring
    }

    fn edges(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        let n = self.ring.len();
        (0..n).map(move |i| (self.ring[i], self.ring[(i + 1) % n]))
    }
}

/// Strict containment: points on an edge or vertex are outside.
pub fn point_in_polygon(point: Coordinate, polygon: &Polygon) -> bool {
    // ---
    if polygon.ring.len() < 3 {
        return false;
    }
    if polygon.edges().any(|(a, b)| on_segment(point, a, b)) {
        return false;
    }

    // Even-odd ray cast along +longitude.
    let (x, y) = (point.latitude, point.longitude);
    let mut inside = false;
    for (a, b) in polygon.edges() {
        let (xa, ya) = (a.latitude, a.longitude);
        let (xb, yb) = (b.latitude, b.longitude);
        if (xa > x) != (xb > x) {
            let y_cross = ya + (x - xa) * (yb - ya) / (xb - xa);
            if y < y_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> bool {
    // ---
    let cross = (b.latitude - a.latitude) * (p.longitude - a.longitude)
        - (b.longitude - a.longitude) * (p.latitude - a.latitude);
    if cross.abs() > EPSILON {
        return false;
    }
    p.latitude >= a.latitude.min(b.latitude) - EPSILON
        && p.latitude <= a.latitude.max(b.latitude) + EPSILON
        && p.longitude >= a.longitude.min(b.longitude) - EPSILON
        && p.longitude <= a.longitude.max(b.longitude) + EPSILON
}
