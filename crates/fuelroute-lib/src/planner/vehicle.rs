//! Vehicle range and efficiency profile.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Default fuel efficiency in miles per gallon.
pub const DEFAULT_MILES_PER_GALLON: f64 = 10.0;

/// Default driving range on a full tank, in miles.
pub const DEFAULT_RANGE_MILES: f64 = 500.0;

/// Upper plausibility bound on fuel efficiency.
pub const MAX_MILES_PER_GALLON: f64 = 100.0;

/// Upper plausibility bound on range.
pub const MAX_RANGE_MILES: f64 = 2000.0;

/// Upper plausibility bound on tank capacity.
pub const MAX_TANK_CAPACITY_GALLONS: f64 = 500.0;

/// Allowed gap between the stated range and efficiency × capacity before a warning.
const RANGE_CONSISTENCY_TOLERANCE_MILES: f64 = 1.0;

/// Range and efficiency profile of the vehicle being routed.
///
/// `range_miles` is authoritative for planning even when it disagrees with
/// `miles_per_gallon × tank_capacity_gallons`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub miles_per_gallon: f64,
    pub range_miles: f64,
    pub tank_capacity_gallons: f64,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self {
            miles_per_gallon: DEFAULT_MILES_PER_GALLON,
            range_miles: DEFAULT_RANGE_MILES,
            tank_capacity_gallons: DEFAULT_RANGE_MILES / DEFAULT_MILES_PER_GALLON,
        }
    }
}

impl VehicleProfile {
    /// Create a validated profile.
    pub fn new(miles_per_gallon: f64, range_miles: f64, tank_capacity_gallons: f64) -> Result<Self> {
        let profile = Self {
            miles_per_gallon,
            range_miles,
            tank_capacity_gallons,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Create a profile whose tank holds exactly one full range of fuel.
    pub fn from_efficiency_and_range(miles_per_gallon: f64, range_miles: f64) -> Result<Self> {
        if !(miles_per_gallon.is_finite() && miles_per_gallon > 0.0) {
            return Err(invalid(format!(
                "miles_per_gallon must be a positive number, got {miles_per_gallon}"
            )));
        }
        Self::new(miles_per_gallon, range_miles, range_miles / miles_per_gallon)
    }

    /// Check that every field is positive, finite and plausible.
    pub fn validate(&self) -> Result<()> {
        check_bounded("miles_per_gallon", self.miles_per_gallon, MAX_MILES_PER_GALLON)?;
        check_bounded("range_miles", self.range_miles, MAX_RANGE_MILES)?;
        check_bounded(
            "tank_capacity_gallons",
            self.tank_capacity_gallons,
            MAX_TANK_CAPACITY_GALLONS,
        )?;
        Ok(())
    }

    /// Range implied by efficiency and tank capacity.
    pub fn implied_range(&self) -> f64 {
        self.miles_per_gallon * self.tank_capacity_gallons
    }

    /// Whether the stated range agrees with efficiency × capacity (within a mile).
    pub fn is_consistent(&self) -> bool {
        (self.range_miles - self.implied_range()).abs() <= RANGE_CONSISTENCY_TOLERANCE_MILES
    }

    pub(crate) fn warn_if_inconsistent(&self) {
        if !self.is_consistent() {
            warn!(
                range_miles = self.range_miles,
                implied_range = self.implied_range(),
                miles_per_gallon = self.miles_per_gallon,
                tank_capacity_gallons = self.tank_capacity_gallons,
                "vehicle range disagrees with efficiency x capacity; using stated range"
            );
        }
    }
}

fn check_bounded(field: &str, value: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{field} must be a positive number, got {value}")));
    }
    if value > max {
        return Err(invalid(format!("{field} must be at most {max}, got {value}")));
    }
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::InvalidVehicleProfile { message }
}
