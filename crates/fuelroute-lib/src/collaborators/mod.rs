//! Interfaces to the services around the planner.
//!
//! Geocoding and road routing live outside this crate. Callers plug in
//! implementations of [`Geocoder`] and [`RouteProvider`]; [`TripPlanner`]
//! strings them together with retries and the fuel stop engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::FuelStopEngine;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::path::RoutePath;
use crate::planner::{FuelStopPlan, VehicleProfile};
use crate::validation::is_known_state;

pub mod retry;

pub use retry::RetryPolicy;

/// Shortest accepted route distance, in miles.
pub const MIN_ROUTE_DISTANCE_MILES: f64 = 0.1;

/// Longest accepted route distance, in miles.
pub const MAX_ROUTE_DISTANCE_MILES: f64 = 10_000.0;

const MIN_LOCATION_LEN: usize = 3;
const MAX_LOCATION_LEN: usize = 255;

/// Resolves a free-text location to coordinates.
pub trait Geocoder: Send + Sync {
    /// Fails with `LocationNotFound` when nothing matches, or
    /// `RouteServiceUnavailable` when the upstream service is down.
    fn geocode(&self, location: &str) -> Result<Coordinate>;
}

/// Driving route returned by a [`RouteProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    /// Decoded path; its total distance is the road distance.
    pub path: RoutePath,
    pub duration_seconds: f64,
}

/// Computes driving routes between two coordinates.
pub trait RouteProvider: Send + Sync {
    /// Service name used in logs and errors.
    fn name(&self) -> &str {
        "route"
    }

    /// Fails with `NoRouteFound` or `RouteServiceUnavailable`.
    fn route(&self, from: Coordinate, to: Coordinate) -> Result<RouteGeometry>;
}

/// Trim a location query and normalize `"city, st"` to `"city, ST"`.
///
/// Queries that are not in city/state form are returned trimmed but otherwise
/// unchanged.
pub fn normalize_location(location: &str) -> Result<String> {
    let trimmed = location.trim();
    let length = trimmed.chars().count();
    if length < MIN_LOCATION_LEN {
        return Err(Error::InvalidLocation {
            location: trimmed.to_string(),
            reason: "location is too short",
        });
    }
    if length > MAX_LOCATION_LEN {
        return Err(Error::InvalidLocation {
            location: trimmed.chars().take(32).collect(),
            reason: "location is too long (max 255 characters)",
        });
    }

    if let Some((city, state)) = trimmed.split_once(',') {
        let state = state.trim();
        if !state.contains(',') && is_known_state(state) {
            return Ok(format!("{}, {}", city.trim(), state.to_ascii_uppercase()));
        }
    }
    Ok(trimmed.to_string())
}

/// Reject route distances outside the plausible range for road trips.
pub fn validate_route_distance(distance_miles: f64) -> Result<()> {
    if !distance_miles.is_finite() || distance_miles < 0.0 {
        return Err(Error::InvalidRoutePath {
            message: format!("route distance must be non-negative, got {distance_miles}"),
        });
    }
    if distance_miles < MIN_ROUTE_DISTANCE_MILES {
        return Err(Error::InvalidRoutePath {
            message: format!("route distance {distance_miles:.3} miles is too short for routing"),
        });
    }
    if distance_miles > MAX_ROUTE_DISTANCE_MILES {
        return Err(Error::InvalidRoutePath {
            message: format!(
                "route distance {distance_miles:.1} miles exceeds maximum ({MAX_ROUTE_DISTANCE_MILES} miles)"
            ),
        });
    }
    Ok(())
}

/// A resolved trip endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Normalized location query.
    pub query: String,
    pub coordinate: Coordinate,
}

/// Result of planning a trip between two named locations.
#[derive(Debug, Clone)]
pub struct TripPlan {
    pub start: Waypoint,
    pub finish: Waypoint,
    pub distance_miles: f64,
    pub duration_seconds: f64,
    pub fuel: Arc<FuelStopPlan>,
}

/// Geocode → route → fuel stops.
pub struct TripPlanner<G, R> {
    geocoder: G,
    router: R,
    engine: Arc<FuelStopEngine>,
    geocode_retry: RetryPolicy,
    route_retry: RetryPolicy,
}

impl<G: Geocoder, R: RouteProvider> TripPlanner<G, R> {
    pub fn new(geocoder: G, router: R, engine: Arc<FuelStopEngine>) -> Self {
        Self {
            geocoder,
            router,
            engine,
            geocode_retry: RetryPolicy::default(),
            route_retry: RetryPolicy::routing(),
        }
    }

    /// Use the same retry policy for geocoding and routing.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.geocode_retry = policy;
        self.route_retry = policy;
        self
    }

    pub fn engine(&self) -> &FuelStopEngine {
        &self.engine
    }

    /// Plan a trip, using `vehicle` or the engine's default vehicle.
    pub fn plan_trip(
        &self,
        start: &str,
        finish: &str,
        vehicle: Option<&VehicleProfile>,
    ) -> Result<TripPlan> {
        let start = self.resolve(start)?;
        let finish = self.resolve(finish)?;

        let geometry = self.route_retry.run(self.router.name(), || {
            self.router.route(start.coordinate, finish.coordinate)
        })?;
        let distance_miles = geometry.path.total_distance();
        validate_route_distance(distance_miles)?;

        let vehicle = vehicle.copied().unwrap_or(self.engine.config().default_vehicle);
        let fuel = self.engine.plan(&geometry.path, &vehicle)?;

        info!(
            start = %start.query,
            finish = %finish.query,
            distance_miles,
            stops = fuel.summary.stop_count,
            total_cost = fuel.summary.total_cost,
            "planned trip"
        );

        Ok(TripPlan {
            start,
            finish,
            distance_miles,
            duration_seconds: geometry.duration_seconds,
            fuel,
        })
    }

    fn resolve(&self, location: &str) -> Result<Waypoint> {
        let query = normalize_location(location)?;
        let coordinate = self
            .geocode_retry
            .run("geocode", || self.geocoder.geocode(&query))?;
        Ok(Waypoint { query, coordinate })
    }
}
