//! Common test utilities and fixture helpers.
//!
//! Synthetic routes run due north along a meridian, where a degree of latitude
//! is exactly [`MILES_PER_DEGREE_LAT`] miles, so station distances can be placed
//! precisely.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use fuelroute_lib::geo::MILES_PER_DEGREE_LAT;
use fuelroute_lib::{Coordinate, FuelStation, RoutePath, StationCatalog, ValidationRules};

/// Latitude where synthetic routes start.
const ORIGIN_LATITUDE: f64 = 10.0;

/// Longitude of synthetic routes.
const MERIDIAN: f64 = -100.0;

/// Path to fixtures directory used by tests (station catalog, route geometry).
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Load the fixture station catalog with default validation rules.
#[allow(dead_code)]
pub fn fixture_catalog() -> StationCatalog {
    let path = fixtures_dir().join("fuel_stations.csv");
    StationCatalog::from_path(&path, &ValidationRules::default())
        .expect("load fixture fuel_stations.csv")
}

/// Load the fixture route along I-40 (lat 35, lon -118 to -100).
#[allow(dead_code)]
pub fn fixture_route() -> RoutePath {
    let path = fixtures_dir().join("route_i40.json");
    let raw = std::fs::read_to_string(&path).expect("read fixture route_i40.json");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("route fixture is JSON");
    let points = value["points"]
        .as_array()
        .expect("points array")
        .iter()
        .map(|pair| {
            let lat = pair[0].as_f64().expect("latitude");
            let lon = pair[1].as_f64().expect("longitude");
            Coordinate::new(lat, lon).expect("valid coordinate")
        })
        .collect();
    RoutePath::new(points).expect("valid fixture route")
}

/// Coordinate `miles` north of the synthetic origin, shifted `east_degrees` off the meridian.
#[allow(dead_code)]
pub fn along(miles: f64, east_degrees: f64) -> Coordinate {
    Coordinate::new(
        ORIGIN_LATITUDE + miles / MILES_PER_DEGREE_LAT,
        MERIDIAN + east_degrees,
    )
    .expect("valid coordinate")
}

/// Straight northbound path of `length_miles` with a vertex every `step_miles`.
#[allow(dead_code)]
pub fn northbound_path(length_miles: f64, step_miles: f64) -> RoutePath {
    let mut points = Vec::new();
    let mut distance = 0.0;
    while distance < length_miles {
        points.push(along(distance, 0.0));
        distance += step_miles;
    }
    points.push(along(length_miles, 0.0));
    RoutePath::new(points).expect("valid synthetic path")
}

/// Station on the synthetic meridian at `miles` from the origin.
#[allow(dead_code)]
pub fn station_at(id: i64, miles: f64, price: f64) -> FuelStation {
    FuelStation {
        id,
        name: format!("Synthetic {id}"),
        address: format!("Mile {miles:.0}"),
        city: "Nowhere".to_string(),
        state: "TX".to_string(),
        rack_id: None,
        location: along(miles, 0.0),
        price,
    }
}

/// Stations every `spacing` miles (exclusive of the origin) up to `length`, priced by `price_at`.
#[allow(dead_code)]
pub fn stations_every<F>(spacing: f64, length: f64, price_at: F) -> Vec<FuelStation>
where
    F: Fn(usize) -> f64,
{
    let count = (length / spacing).floor() as usize;
    (1..=count)
        .map(|i| station_at(i as i64, i as f64 * spacing, price_at(i)))
        .collect()
}

/// Seeded generator so property-style tests are reproducible.
#[allow(dead_code)]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
