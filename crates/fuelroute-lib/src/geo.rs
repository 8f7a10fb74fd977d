//! Geodesic helpers: coordinates, great-circle distance and bounding boxes.
//!
//! All distances are in miles on a spherical earth. Errors of a few tens of
//! metres over segments of a few kilometres are acceptable for route planning,
//! so no ellipsoidal model is used.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Length of one degree of latitude in miles.
pub const MILES_PER_DEGREE_LAT: f64 = EARTH_RADIUS_MILES * std::f64::consts::PI / 180.0;

/// Smallest cosine used when converting miles to degrees of longitude.
const MIN_LONGITUDE_COSINE: f64 = 0.01;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
                reason: "coordinates must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
                reason: "latitude must be between -90 and 90",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
                reason: "longitude must be between -180 and 180",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another coordinate in miles.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_miles(*self, *other)
    }
}

/// Great-circle distance between two coordinates in miles (haversine formula).
pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * c
}

/// Degrees of longitude spanned by `miles` at the given latitude.
pub fn miles_to_longitude_degrees(miles: f64, latitude: f64) -> f64 {
    let cosine = latitude.to_radians().cos().max(MIN_LONGITUDE_COSINE);
    miles / (MILES_PER_DEGREE_LAT * cosine)
}

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box covering a single point.
    pub fn around(point: Coordinate) -> Self {
        Self {
            min_lat: point.latitude,
            max_lat: point.latitude,
            min_lon: point.longitude,
            max_lon: point.longitude,
        }
    }

    /// Smallest box enclosing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = Self::around(*first);
        for point in rest {
            bbox.include(*point);
        }
        Some(bbox)
    }

    /// Grow the box to include `point`.
    pub fn include(&mut self, point: Coordinate) {
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lat = self.max_lat.max(point.latitude);
        self.min_lon = self.min_lon.min(point.longitude);
        self.max_lon = self.max_lon.max(point.longitude);
    }

    /// Expand the box by `miles` in every direction, clamped to valid coordinates.
    ///
    /// The longitude margin is computed at the highest absolute latitude of the
    /// expanded box, where a degree of longitude is shortest, so points within
    /// `miles` of the original box are never left outside.
    pub fn expanded_by_miles(&self, miles: f64) -> Self {
        let lat_margin = miles / MILES_PER_DEGREE_LAT;
        let min_lat = (self.min_lat - lat_margin).max(-90.0);
        let max_lat = (self.max_lat + lat_margin).min(90.0);
        let widest_lat = min_lat.abs().max(max_lat.abs());
        let lon_margin = miles_to_longitude_degrees(miles, widest_lat);

        Self {
            min_lat,
            max_lat,
            min_lon: (self.min_lon - lon_margin).max(-180.0),
            max_lon: (self.max_lon + lon_margin).min(180.0),
        }
    }

    /// Expand the box by a fixed number of degrees on every side.
    pub fn padded_by_degrees(&self, degrees: f64) -> Self {
        Self {
            min_lat: self.min_lat - degrees,
            max_lat: self.max_lat + degrees,
            min_lon: self.min_lon - degrees,
            max_lon: self.max_lon + degrees,
        }
    }

    /// Whether the point lies inside the box (edges inclusive).
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let p = coord(36.1, -115.1);
        assert!(haversine_miles(p, p) < 1e-9);
    }

    #[test]
    fn haversine_matches_known_city_pair() {
        // Las Vegas to Los Angeles is roughly 230 miles as the crow flies.
        let las_vegas = coord(36.17, -115.14);
        let los_angeles = coord(34.05, -118.24);
        let distance = haversine_miles(las_vegas, los_angeles);
        assert!(distance > 220.0 && distance < 240.0, "got {distance}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_69_miles() {
        let d = haversine_miles(coord(40.0, -100.0), coord(41.0, -100.0));
        assert!((d - MILES_PER_DEGREE_LAT).abs() < 1e-6);
        assert!((d - 69.1).abs() < 0.1);
    }

    #[test]
    fn expanded_box_covers_points_at_margin_distance() {
        let bbox = BoundingBox::around(coord(45.0, -100.0)).expanded_by_miles(20.0);
        // Due east and due north, just inside 20 miles.
        let east = coord(45.0, -100.0 + miles_to_longitude_degrees(19.9, 45.0));
        let north = coord(45.0 + 19.9 / MILES_PER_DEGREE_LAT, -100.0);
        assert!(bbox.contains(east));
        assert!(bbox.contains(north));
        assert!(!bbox.contains(coord(46.0, -100.0)));
    }

    #[test]
    fn enclosing_empty_slice_is_none() {
        assert!(BoundingBox::enclosing(&[]).is_none());
    }
}
