//! Planner configuration.
//!
//! # Environment Variables
//!
//! [`PlannerConfig::from_env`] starts from the defaults and applies any of:
//!
//! - `FUELROUTE_SAFETY_FACTOR`: fraction of vehicle range used (default `0.9`)
//! - `FUELROUTE_CORRIDOR_MILES`: max station distance from the route (default `15`)
//! - `FUELROUTE_MARGIN_FACTOR`: candidate pre-filter margin ratio (default `1.25`)
//! - `FUELROUTE_STRATEGY`: `greedy` (default) or `optimal`
//! - `FUELROUTE_REFUEL_POLICY`: `minimum` (default) or `fill`
//! - `FUELROUTE_MIN_PRICE` / `FUELROUTE_MAX_PRICE`: plausible price band in USD
//! - `FUELROUTE_STATE_TOLERANCE`: state region padding in degrees
//! - `FUELROUTE_CACHE_TTL_SECS` / `FUELROUTE_CACHE_CAPACITY`: plan cache bounds
//! - `FUELROUTE_MPG` / `FUELROUTE_RANGE_MILES` / `FUELROUTE_TANK_GALLONS`: default vehicle
//!
//! Unparseable values are ignored with a warning.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::candidates::DEFAULT_MARGIN_FACTOR;
use crate::error::{Error, Result};
use crate::planner::{PlanOptions, PlanStrategy, RefuelPolicy, VehicleProfile, DEFAULT_SAFETY_FACTOR};
use crate::validation::ValidationRules;

/// Default maximum distance between a station and the route, in miles.
pub const DEFAULT_CORRIDOR_MILES: f64 = 15.0;

/// Settings shared by every plan an engine produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub safety_factor: f64,
    pub corridor_miles: f64,
    pub margin_factor: f64,
    pub strategy: PlanStrategy,
    pub refuel_policy: RefuelPolicy,
    pub validation: ValidationRules,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    /// Vehicle used when a request does not supply one.
    pub default_vehicle: VehicleProfile,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            safety_factor: DEFAULT_SAFETY_FACTOR,
            corridor_miles: DEFAULT_CORRIDOR_MILES,
            margin_factor: DEFAULT_MARGIN_FACTOR,
            strategy: PlanStrategy::default(),
            refuel_policy: RefuelPolicy::default(),
            validation: ValidationRules::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_vehicle: VehicleProfile::default(),
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `FUELROUTE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by values from `lookup` (keyed by variable name).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_from(&lookup, "FUELROUTE_SAFETY_FACTOR", &mut config.safety_factor);
        override_from(&lookup, "FUELROUTE_CORRIDOR_MILES", &mut config.corridor_miles);
        override_from(&lookup, "FUELROUTE_MARGIN_FACTOR", &mut config.margin_factor);
        override_from(&lookup, "FUELROUTE_STRATEGY", &mut config.strategy);
        override_from(&lookup, "FUELROUTE_REFUEL_POLICY", &mut config.refuel_policy);
        override_from(&lookup, "FUELROUTE_MIN_PRICE", &mut config.validation.min_price);
        override_from(&lookup, "FUELROUTE_MAX_PRICE", &mut config.validation.max_price);
        override_from(
            &lookup,
            "FUELROUTE_STATE_TOLERANCE",
            &mut config.validation.state_tolerance_degrees,
        );
        override_from(&lookup, "FUELROUTE_CACHE_TTL_SECS", &mut config.cache_ttl_secs);
        override_from(&lookup, "FUELROUTE_CACHE_CAPACITY", &mut config.cache_capacity);
        override_from(&lookup, "FUELROUTE_MPG", &mut config.default_vehicle.miles_per_gallon);
        override_from(&lookup, "FUELROUTE_RANGE_MILES", &mut config.default_vehicle.range_miles);
        override_from(
            &lookup,
            "FUELROUTE_TANK_GALLONS",
            &mut config.default_vehicle.tank_capacity_gallons,
        );

        config
    }

    /// Check every setting, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.plan_options().validate()?;
        if !self.corridor_miles.is_finite() || self.corridor_miles <= 0.0 {
            return Err(Error::InvalidConfig {
                message: format!("corridor_miles must be positive, got {}", self.corridor_miles),
            });
        }
        if !self.margin_factor.is_finite() || self.margin_factor < 1.0 {
            return Err(Error::InvalidConfig {
                message: format!("margin_factor must be at least 1.0, got {}", self.margin_factor),
            });
        }
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfig {
                message: "cache_capacity must be at least 1".to_string(),
            });
        }
        self.validation.validate()?;
        self.default_vehicle.validate()
    }

    /// Options handed to the stop planner.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            safety_factor: self.safety_factor,
            strategy: self.strategy,
            refuel_policy: self.refuel_policy,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn override_from<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(variable = name, value = %raw, "ignoring unparseable configuration value"),
    }
}
