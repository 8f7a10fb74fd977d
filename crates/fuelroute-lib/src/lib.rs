//! Fuel route library entry points.
//!
//! This crate loads fuel station catalogs, projects stations onto a driving
//! route and plans the cheapest set of refueling stops that keeps the vehicle
//! within range. Higher-level consumers (CLI, services) should only depend on
//! the functions exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod cache;
pub mod candidates;
pub mod catalog;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod output;
pub mod path;
pub mod planner;
pub mod projection;
pub mod validation;

pub use cache::{PlanCache, RouteFingerprint};
pub use candidates::{select_candidates, CandidateIndex, RouteEnvelope};
pub use catalog::{
    CatalogHandle, CatalogLoadReport, CatalogSnapshot, FuelStation, RejectedStation,
    StationCatalog, StationId,
};
pub use collaborators::{
    normalize_location, validate_route_distance, Geocoder, RetryPolicy, RouteGeometry,
    RouteProvider, TripPlan, TripPlanner, Waypoint,
};
pub use config::PlannerConfig;
pub use engine::{plan_fuel_stops, FuelStopEngine};
pub use error::{Error, Result};
pub use geo::{haversine_miles, BoundingBox, Coordinate};
pub use output::PlanRenderMode;
pub use path::{decode_polyline, RoutePath, DEFAULT_POLYLINE_PRECISION};
pub use planner::{
    plan, select_strategy, FuelStop, FuelStopPlan, PlanOptions, PlanStrategy, PlanSummary,
    RefuelPolicy, StationSummary, StopStrategy, VehicleProfile,
};
pub use projection::{project, ProjectedStation};
pub use validation::{validate_station, ValidationRules};
