//! Route path geometry.
//!
//! A [`RoutePath`] is the decoded polyline returned by the routing collaborator.
//! Cumulative distance-along-route is precomputed once per path so projection
//! and planning never re-walk the geometry.

use crate::error::{Error, Result};
use crate::geo::{haversine_miles, BoundingBox, Coordinate};

/// Precision used by OSRM and Google encoded polylines.
pub const DEFAULT_POLYLINE_PRECISION: u32 = 5;

/// Ordered, non-empty driving path with precomputed cumulative distances.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    points: Vec<Coordinate>,
    cumulative: Vec<f64>,
    total_distance: f64,
}

impl RoutePath {
    /// Build a path whose total distance is the haversine length of the polyline.
    pub fn new(points: Vec<Coordinate>) -> Result<Self> {
        let cumulative = cumulative_distances(&points)?;
        let total_distance = cumulative.last().copied().unwrap_or(0.0);
        Ok(Self {
            points,
            cumulative,
            total_distance,
        })
    }

    /// Build a path with an authoritative total distance, typically the road
    /// distance reported by the routing service.
    pub fn with_total_distance(points: Vec<Coordinate>, total_distance: f64) -> Result<Self> {
        if !total_distance.is_finite() || total_distance < 0.0 {
            return Err(Error::InvalidRoutePath {
                message: format!(
                    "total distance must be finite and non-negative, got {total_distance}"
                ),
            });
        }
        let cumulative = cumulative_distances(&points)?;
        Ok(Self {
            points,
            cumulative,
            total_distance,
        })
    }

    /// Decode an encoded polyline into a path.
    pub fn from_polyline(encoded: &str, precision: u32) -> Result<Self> {
        Self::new(decode_polyline(encoded, precision)?)
    }

    /// Path vertices in driving order.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Distance from the start to each vertex, in miles.
    pub fn cumulative_distances(&self) -> &[f64] {
        &self.cumulative
    }

    /// Total route length used for planning, in miles.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Haversine length of the polyline itself, in miles.
    pub fn geometric_length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: paths are validated non-empty at construction.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of segments between consecutive vertices.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Smallest box enclosing every vertex.
    pub fn bounds(&self) -> BoundingBox {
        // Non-empty by construction.
        BoundingBox::enclosing(&self.points).unwrap_or(BoundingBox::around(self.points[0]))
    }

    /// Start coordinate.
    pub fn start(&self) -> Coordinate {
        self.points[0]
    }

    /// Final coordinate.
    pub fn end(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }
}

fn cumulative_distances(points: &[Coordinate]) -> Result<Vec<f64>> {
    if points.is_empty() {
        return Err(Error::InvalidRoutePath {
            message: "path must contain at least one coordinate".to_string(),
        });
    }

    let mut cumulative = Vec::with_capacity(points.len());
    let mut running = 0.0;
    cumulative.push(running);
    for pair in points.windows(2) {
        running += haversine_miles(pair[0], pair[1]);
        cumulative.push(running);
    }
    Ok(cumulative)
}

/// Decode an encoded polyline (Google/OSRM algorithm) into coordinates.
///
/// `precision` is the number of decimal digits encoded per value: 5 for OSRM
/// `polyline`, 6 for `polyline6`.
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<Coordinate>> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();

    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat += decode_value(bytes, &mut index)?;
        lon += decode_value(bytes, &mut index)?;
        points.push(Coordinate::new(lat as f64 / factor, lon as f64 / factor)?);
    }

    Ok(points)
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(Error::InvalidPolyline {
                position: *index,
                message: "unexpected end of input".to_string(),
            });
        };
        if !(63..=126).contains(&byte) {
            return Err(Error::InvalidPolyline {
                position: *index,
                message: format!("invalid character {:?}", byte as char),
            });
        }

        let chunk = i64::from(byte - 63);
        *index += 1;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
        if shift > 60 {
            return Err(Error::InvalidPolyline {
                position: *index,
                message: "value exceeds 64 bits".to_string(),
            });
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}
