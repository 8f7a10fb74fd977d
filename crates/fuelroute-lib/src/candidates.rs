//! Corridor pre-filter for station catalogs.
//!
//! Before the (comparatively expensive) perpendicular projection runs, the
//! catalog is cut down to stations inside the route's bounding envelope. The
//! filter may let through stations that are too far from the route; projection
//! removes those. It must never drop a station that lies inside the corridor,
//! which is why the envelope margin is always at least the corridor width.

use tracing::debug;

use crate::catalog::FuelStation;
use crate::geo::{BoundingBox, Coordinate};
use crate::path::RoutePath;

/// Default ratio between the envelope margin and the corridor width.
pub const DEFAULT_MARGIN_FACTOR: f64 = 1.25;

/// Number of path segments covered by each envelope chunk.
const SEGMENTS_PER_CHUNK: usize = 32;

/// Expanded bounding boxes around a route: one overall box plus one per chunk
/// of consecutive segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEnvelope {
    bounds: BoundingBox,
    chunks: Vec<BoundingBox>,
}

impl RouteEnvelope {
    /// Build the envelope for `path`, expanded by `margin_miles` on every side.
    pub fn new(path: &RoutePath, margin_miles: f64) -> Self {
        let points = path.points();
        let last = points.len() - 1;

        let mut chunks = Vec::with_capacity(path.segment_count() / SEGMENTS_PER_CHUNK + 1);
        let mut start = 0;
        loop {
            // Chunks share their boundary vertex so every segment is covered.
            let end = (start + SEGMENTS_PER_CHUNK).min(last);
            if let Some(bbox) = BoundingBox::enclosing(&points[start..=end]) {
                chunks.push(bbox.expanded_by_miles(margin_miles));
            }
            if end >= last {
                break;
            }
            start = end;
        }

        Self {
            bounds: path.bounds().expanded_by_miles(margin_miles),
            chunks,
        }
    }

    /// Expanded box enclosing the whole route.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Per-chunk expanded boxes.
    pub fn chunks(&self) -> &[BoundingBox] {
        &self.chunks
    }

    /// Whether a point may lie inside the route corridor.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.bounds.contains(point) && self.chunks.iter().any(|chunk| chunk.contains(point))
    }
}

fn envelope_margin(corridor_miles: f64, margin_factor: f64) -> f64 {
    corridor_miles.max(0.0) * margin_factor.max(1.0)
}

/// Filter `stations` down to those inside the route envelope.
///
/// Linear scan over the slice; use [`CandidateIndex`] when the same catalog is
/// queried repeatedly. Never fails: an empty result means no station is near
/// the route.
pub fn select_candidates<'a>(
    path: &RoutePath,
    stations: &'a [FuelStation],
    corridor_miles: f64,
    margin_factor: f64,
) -> Vec<&'a FuelStation> {
    let envelope = RouteEnvelope::new(path, envelope_margin(corridor_miles, margin_factor));
    stations
        .iter()
        .filter(|station| envelope.contains(station.location))
        .collect()
}

/// Stations ordered by latitude so an envelope's latitude band is found by
/// binary search instead of a catalog scan.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    stations: Vec<FuelStation>,
}

impl CandidateIndex {
    /// Build the index, taking ownership of the stations.
    pub fn new(mut stations: Vec<FuelStation>) -> Self {
        stations.sort_by(|a, b| {
            a.location
                .latitude
                .total_cmp(&b.location.latitude)
                .then(a.id.cmp(&b.id))
        });
        Self { stations }
    }

    /// Indexed stations in latitude order.
    pub fn stations(&self) -> &[FuelStation] {
        &self.stations
    }

    /// Stations inside the envelope of `path` expanded by
    /// `corridor_miles × margin_factor` (the factor is never taken below 1.0).
    pub fn select(
        &self,
        path: &RoutePath,
        corridor_miles: f64,
        margin_factor: f64,
    ) -> Vec<&FuelStation> {
        let envelope = RouteEnvelope::new(path, envelope_margin(corridor_miles, margin_factor));
        let bounds = envelope.bounds();

        let lower = self
            .stations
            .partition_point(|s| s.location.latitude < bounds.min_lat);
        let upper = self
            .stations
            .partition_point(|s| s.location.latitude <= bounds.max_lat);

        let candidates: Vec<&FuelStation> = self.stations[lower..upper.max(lower)]
            .iter()
            .filter(|station| envelope.contains(station.location))
            .collect();

        debug!(
            catalog = self.stations.len(),
            latitude_band = upper.saturating_sub(lower),
            candidates = candidates.len(),
            chunks = envelope.chunks().len(),
            "selected candidate stations"
        );

        candidates
    }
}
