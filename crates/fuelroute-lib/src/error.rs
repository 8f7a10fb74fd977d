use thiserror::Error;

use crate::catalog::StationId;

/// Convenient result alias for the fuel route library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the destination cannot be reached with the stations along the route.
    #[error(
        "vehicle range ({usable_range:.1} usable miles) is insufficient for route distance \
         ({route_distance:.1} miles) with available fuel stations; stranded after mile {position:.1}"
    )]
    InsufficientRange {
        route_distance: f64,
        usable_range: f64,
        position: f64,
    },

    /// Raised when a refuel is required but no station lies along the route at all.
    #[error("no fuel stations found along route ({route_distance:.1} miles)")]
    NoFuelStationsFound { route_distance: f64 },

    /// Raised when a station's coordinates fall outside its declared state.
    #[error("coordinates ({latitude}, {longitude}) for station {station_id} appear inconsistent with state {state}")]
    CoordinateMismatch {
        station_id: StationId,
        state: String,
        latitude: f64,
        longitude: f64,
    },

    /// Raised when a station's price falls outside the plausible band.
    #[error("unusual price ${price:.2} at station {station_id}: {reason}")]
    PriceAnomaly {
        station_id: StationId,
        price: f64,
        reason: String,
    },

    /// Raised when station data is malformed or incomplete.
    #[error("invalid station data: {message}")]
    StationDataValidation { message: String },

    /// Raised when a latitude/longitude pair is out of range or not finite.
    #[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        reason: &'static str,
    },

    /// Raised when a route path cannot be constructed.
    #[error("invalid route path: {message}")]
    InvalidRoutePath { message: String },

    /// Raised when an encoded polyline cannot be decoded.
    #[error("invalid polyline encoding at byte {position}: {message}")]
    InvalidPolyline { position: usize, message: String },

    /// Raised when vehicle parameters are out of bounds.
    #[error("invalid vehicle profile: {message}")]
    InvalidVehicleProfile { message: String },

    /// Raised when planner configuration values are unusable.
    #[error("invalid planner configuration: {message}")]
    InvalidConfig { message: String },

    /// Raised when a location query is empty, too short or too long.
    #[error("invalid location '{location}': {reason}")]
    InvalidLocation {
        location: String,
        reason: &'static str,
    },

    /// Raised by geocoders when a location string cannot be resolved.
    #[error("location not found: {location}")]
    LocationNotFound { location: String },

    /// Raised by route providers when no drivable route exists.
    #[error("no route found between {start} and {goal}")]
    NoRouteFound { start: String, goal: String },

    /// Raised by route providers on upstream failures (timeouts, 5xx, rate limits).
    #[error("routing service '{service}' is currently unavailable: {message}")]
    RouteServiceUnavailable { service: String, message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether retrying the same call may succeed.
    ///
    /// Everything raised by the optimizer itself is deterministic; only upstream
    /// service outages are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RouteServiceUnavailable { .. })
    }
}
