//! Fuel stop planning.
//!
//! This module is organized into focused submodules:
//!
//! - [`vehicle`] - Vehicle range and efficiency profile
//! - [`strategy`] - Stop selection strategies (greedy and minimum-cost)
//!
//! Planning runs in two phases: a [`StopStrategy`] picks the stations, then the
//! [`RefuelPolicy`] decides how many gallons to buy at each one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{FuelStation, StationId};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::projection::ProjectedStation;

pub mod strategy;
pub mod vehicle;

pub use strategy::{select_strategy, GreedyStrategy, OptimalStrategy, StopSearch, StopStrategy};
pub use vehicle::VehicleProfile;

/// Default fraction of the vehicle range used for planning.
pub const DEFAULT_SAFETY_FACTOR: f64 = 0.9;

/// Supported stop selection strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategy {
    /// Cheapest station within reach at each step.
    #[default]
    Greedy,
    /// Minimum total fuel cost over the whole route.
    Optimal,
}

impl fmt::Display for PlanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            PlanStrategy::Greedy => "greedy",
            PlanStrategy::Optimal => "optimal",
        };
        f.write_str(value)
    }
}

impl FromStr for PlanStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(PlanStrategy::Greedy),
            "optimal" | "dp" => Ok(PlanStrategy::Optimal),
            other => Err(Error::InvalidConfig {
                message: format!("unknown plan strategy '{other}' (expected greedy or optimal)"),
            }),
        }
    }
}

/// How many gallons to buy at each selected stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefuelPolicy {
    /// Buy just enough for the next leg, bounded by the tank.
    #[default]
    MinimumForNextLeg,
    /// Fill the tank at every stop.
    FillTank,
}

impl fmt::Display for RefuelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RefuelPolicy::MinimumForNextLeg => "minimum_for_next_leg",
            RefuelPolicy::FillTank => "fill_tank",
        };
        f.write_str(value)
    }
}

impl FromStr for RefuelPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimum" | "minimum_for_next_leg" => Ok(RefuelPolicy::MinimumForNextLeg),
            "fill" | "fill_tank" => Ok(RefuelPolicy::FillTank),
            other => Err(Error::InvalidConfig {
                message: format!("unknown refuel policy '{other}' (expected minimum or fill)"),
            }),
        }
    }
}

/// Knobs for a single planning run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanOptions {
    /// Fraction of the vehicle range actually used, in (0, 1].
    pub safety_factor: f64,
    pub strategy: PlanStrategy,
    pub refuel_policy: RefuelPolicy,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            safety_factor: DEFAULT_SAFETY_FACTOR,
            strategy: PlanStrategy::default(),
            refuel_policy: RefuelPolicy::default(),
        }
    }
}

impl PlanOptions {
    /// Validate the option values.
    pub fn validate(&self) -> Result<()> {
        if !self.safety_factor.is_finite() || self.safety_factor <= 0.0 || self.safety_factor > 1.0
        {
            return Err(Error::InvalidConfig {
                message: format!(
                    "safety_factor must be in (0, 1], got {}",
                    self.safety_factor
                ),
            });
        }
        Ok(())
    }
}

/// Station details carried in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub id: StationId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub location: Coordinate,
    /// Retail price per gallon in USD.
    pub price: f64,
}

impl From<&FuelStation> for StationSummary {
    fn from(station: &FuelStation) -> Self {
        Self {
            id: station.id,
            name: station.name.clone(),
            address: station.address.clone(),
            city: station.city.clone(),
            state: station.state.clone(),
            location: station.location,
            price: station.price,
        }
    }
}

/// A refueling stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStop {
    pub station: StationSummary,
    /// Miles from the route start.
    pub distance_from_start: f64,
    /// Perpendicular distance from the station to the route, in miles.
    pub offset: f64,
    /// Miles to the next stop or the destination.
    pub leg_distance: f64,
    pub gallons: f64,
    /// Cost of this stop in USD.
    pub cost: f64,
}

/// Aggregate figures for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_distance: f64,
    pub usable_range: f64,
    pub total_cost: f64,
    pub total_gallons: f64,
    pub stop_count: usize,
    pub strategy: PlanStrategy,
    pub refuel_policy: RefuelPolicy,
    /// Stations inside the corridor that the strategy could choose from.
    pub stations_considered: usize,
}

/// Ordered refueling stops plus summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStopPlan {
    pub stops: Vec<FuelStop>,
    pub summary: PlanSummary,
}

impl FuelStopPlan {
    /// Returns true when the trip needs no refueling.
    pub fn is_direct(&self) -> bool {
        self.stops.is_empty()
    }
}

/// Plan refueling stops over projected stations.
///
/// `stations` must be sorted by distance from start, as returned by
/// [`crate::projection::project`].
///
/// # Errors
///
/// * `InvalidVehicleProfile` / `InvalidConfig` / `InvalidRoutePath` for bad inputs.
/// * `NoFuelStationsFound` when a stop is needed but `stations` is empty.
/// * `InsufficientRange` when some gap between stations exceeds the usable range.
pub fn plan(
    stations: &[ProjectedStation<'_>],
    total_distance: f64,
    vehicle: &VehicleProfile,
    options: &PlanOptions,
) -> Result<FuelStopPlan> {
    options.validate()?;
    vehicle.validate()?;
    if !total_distance.is_finite() || total_distance < 0.0 {
        return Err(Error::InvalidRoutePath {
            message: format!("total distance must be finite and non-negative, got {total_distance}"),
        });
    }
    vehicle.warn_if_inconsistent();

    let search = StopSearch {
        total_distance,
        usable_range: vehicle.range_miles * options.safety_factor,
        miles_per_gallon: vehicle.miles_per_gallon,
        tank_capacity_gallons: vehicle.tank_capacity_gallons,
    };

    let strategy = select_strategy(options.strategy);
    let indices = strategy.select_stops(stations, &search)?;
    let stops = refuel(stations, &indices, &search, options.refuel_policy);

    let summary = PlanSummary {
        total_distance,
        usable_range: search.usable_range,
        total_cost: stops.iter().map(|stop| stop.cost).sum(),
        total_gallons: stops.iter().map(|stop| stop.gallons).sum(),
        stop_count: stops.len(),
        strategy: strategy.strategy(),
        refuel_policy: options.refuel_policy,
        stations_considered: stations.len(),
    };

    info!(
        strategy = %summary.strategy,
        total_distance = summary.total_distance,
        stops = summary.stop_count,
        total_cost = summary.total_cost,
        stations_considered = summary.stations_considered,
        "planned fuel stops"
    );

    Ok(FuelStopPlan { stops, summary })
}

/// Compute gallons and cost for each chosen stop.
fn refuel(
    stations: &[ProjectedStation<'_>],
    indices: &[usize],
    search: &StopSearch,
    policy: RefuelPolicy,
) -> Vec<FuelStop> {
    let capacity = search.tank_capacity_gallons;
    let mpg = search.miles_per_gallon;

    let mut fuel_after_previous = capacity;
    let mut previous_position = 0.0;

    indices
        .iter()
        .enumerate()
        .map(|(i, &index)| {
            let projected = &stations[index];
            let here = projected.distance_from_start;
            let next = indices
                .get(i + 1)
                .map_or(search.total_distance, |&n| stations[n].distance_from_start);
            let leg_distance = next - here;

            let gallons = match policy {
                RefuelPolicy::MinimumForNextLeg => (leg_distance / mpg).min(capacity),
                RefuelPolicy::FillTank => {
                    let used = (here - previous_position) / mpg;
                    let on_arrival = (fuel_after_previous - used).max(0.0);
                    capacity - on_arrival
                }
            };
            fuel_after_previous = capacity;
            previous_position = here;

            FuelStop {
                station: StationSummary::from(projected.station),
                distance_from_start: here,
                offset: projected.offset,
                leg_distance,
                gallons,
                cost: gallons * projected.station.price,
            }
        })
        .collect()
}
