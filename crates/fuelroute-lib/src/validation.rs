//! Data-quality guards applied to station records at catalog load time.
//!
//! Stations failing these checks are excluded from the catalog and logged; the
//! planner only ever sees validated stations.

use serde::{Deserialize, Serialize};

use crate::catalog::FuelStation;
use crate::error::{Error, Result};
use crate::geo::BoundingBox;

/// Default lowest plausible retail price per gallon.
pub const DEFAULT_MIN_PRICE: f64 = 0.50;

/// Default highest plausible retail price per gallon.
pub const DEFAULT_MAX_PRICE: f64 = 20.00;

/// Default padding applied to state regions, in degrees.
pub const DEFAULT_STATE_TOLERANCE_DEGREES: f64 = 0.25;

/// Approximate bounding regions of US states: (code, min_lat, max_lat, min_lon, max_lon).
const STATE_REGIONS: &[(&str, f64, f64, f64, f64)] = &[
    ("AL", 30.1, 35.1, -88.5, -84.9),
    ("AK", 51.2, 71.5, -179.2, -129.9),
    ("AZ", 31.3, 37.0, -114.9, -109.0),
    ("AR", 33.0, 36.5, -94.7, -89.6),
    ("CA", 32.5, 42.0, -124.5, -114.0),
    ("CO", 36.9, 41.1, -109.1, -102.0),
    ("CT", 40.9, 42.1, -73.8, -71.7),
    ("DC", 38.79, 39.0, -77.12, -76.9),
    ("DE", 38.4, 39.9, -75.8, -75.0),
    ("FL", 24.5, 31.0, -87.6, -80.0),
    ("GA", 30.3, 35.0, -85.7, -80.8),
    ("HI", 18.9, 22.3, -160.3, -154.8),
    ("IA", 40.3, 43.5, -96.7, -90.1),
    ("ID", 41.9, 49.0, -117.3, -111.0),
    ("IL", 37.0, 42.5, -91.5, -87.5),
    ("IN", 37.7, 41.8, -88.1, -84.8),
    ("KS", 36.9, 40.1, -102.1, -94.6),
    ("KY", 36.4, 39.2, -89.6, -81.9),
    ("LA", 28.9, 33.1, -94.1, -88.8),
    ("MA", 41.2, 42.9, -73.5, -69.9),
    ("MD", 37.9, 39.8, -79.5, -75.0),
    ("ME", 42.9, 47.5, -71.1, -66.9),
    ("MI", 41.7, 48.3, -90.5, -82.1),
    ("MN", 43.5, 49.4, -97.3, -89.5),
    ("MO", 36.0, 40.7, -95.8, -89.1),
    ("MS", 30.1, 35.0, -91.7, -88.1),
    ("MT", 44.3, 49.0, -116.1, -104.0),
    ("NC", 33.8, 36.6, -84.3, -75.4),
    ("ND", 45.9, 49.0, -104.1, -96.5),
    ("NE", 40.0, 43.0, -104.1, -95.3),
    ("NH", 42.7, 45.3, -72.6, -70.6),
    ("NJ", 38.9, 41.4, -75.6, -73.9),
    ("NM", 31.3, 37.0, -109.1, -103.0),
    ("NV", 35.0, 42.0, -120.0, -114.0),
    ("NY", 40.5, 45.0, -79.8, -71.8),
    ("OH", 38.4, 42.3, -84.8, -80.5),
    ("OK", 33.6, 37.0, -103.0, -94.4),
    ("OR", 41.9, 46.3, -124.6, -116.4),
    ("PA", 39.7, 42.3, -80.6, -74.7),
    ("RI", 41.1, 42.1, -71.9, -71.1),
    ("SC", 32.0, 35.3, -83.4, -78.5),
    ("SD", 42.4, 45.95, -104.1, -96.4),
    ("TN", 34.9, 36.7, -90.3, -81.6),
    ("TX", 25.8, 36.5, -106.7, -93.5),
    ("UT", 36.9, 42.0, -114.1, -109.0),
    ("VA", 36.5, 39.5, -83.7, -75.2),
    ("VT", 42.7, 45.1, -73.5, -71.4),
    ("WA", 45.5, 49.0, -124.8, -116.9),
    ("WI", 42.4, 47.1, -92.9, -86.8),
    ("WV", 37.2, 40.7, -82.7, -77.7),
    ("WY", 40.9, 45.1, -111.1, -104.0),
];

/// Look up the approximate bounding region of a US state by its two-letter code.
pub fn state_region(code: &str) -> Option<BoundingBox> {
    let code = code.trim();
    STATE_REGIONS
        .iter()
        .find(|(candidate, ..)| candidate.eq_ignore_ascii_case(code))
        .map(|&(_, min_lat, max_lat, min_lon, max_lon)| BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
}

/// Whether `code` is a recognised US state or DC code.
pub fn is_known_state(code: &str) -> bool {
    state_region(code).is_some()
}

/// Thresholds used when validating station records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub min_price: f64,
    pub max_price: f64,
    /// Padding applied to each state's region before the containment check.
    pub state_tolerance_degrees: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            state_tolerance_degrees: DEFAULT_STATE_TOLERANCE_DEGREES,
        }
    }
}

impl ValidationRules {
    /// Validate the rule thresholds themselves.
    pub fn validate(&self) -> Result<()> {
        if !self.min_price.is_finite() || self.min_price < 0.0 {
            return Err(Error::InvalidConfig {
                message: format!("min_price must be finite and non-negative, got {}", self.min_price),
            });
        }
        if !self.max_price.is_finite() || self.max_price <= self.min_price {
            return Err(Error::InvalidConfig {
                message: format!(
                    "max_price must be finite and above min_price ({}), got {}",
                    self.min_price, self.max_price
                ),
            });
        }
        if !self.state_tolerance_degrees.is_finite() || self.state_tolerance_degrees < 0.0 {
            return Err(Error::InvalidConfig {
                message: "state_tolerance_degrees must be finite and non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Validate a single station against the rules.
///
/// Checks, in order: non-empty name, known state code, coordinates inside the
/// state's (padded) region, and price inside the plausible band.
pub fn validate_station(station: &FuelStation, rules: &ValidationRules) -> Result<()> {
    if station.name.trim().is_empty() {
        return Err(Error::StationDataValidation {
            message: format!("station {} has an empty name", station.id),
        });
    }

    let Some(region) = state_region(&station.state) else {
        return Err(Error::StationDataValidation {
            message: format!("station {} has unknown state code '{}'", station.id, station.state),
        });
    };

    if !region
        .padded_by_degrees(rules.state_tolerance_degrees)
        .contains(station.location)
    {
        return Err(Error::CoordinateMismatch {
            station_id: station.id,
            state: station.state.clone(),
            latitude: station.location.latitude,
            longitude: station.location.longitude,
        });
    }

    check_price(station, rules)
}

fn check_price(station: &FuelStation, rules: &ValidationRules) -> Result<()> {
    let price = station.price;
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::PriceAnomaly {
            station_id: station.id,
            price,
            reason: "price must be a positive number".to_string(),
        });
    }
    if price < rules.min_price {
        return Err(Error::PriceAnomaly {
            station_id: station.id,
            price,
            reason: format!("below minimum ${:.2}", rules.min_price),
        });
    }
    if price > rules.max_price {
        return Err(Error::PriceAnomaly {
            station_id: station.id,
            price,
            reason: format!("exceeds maximum ${:.2}", rules.max_price),
        });
    }
    Ok(())
}
