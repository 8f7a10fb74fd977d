//! Fuel stop planning pipeline.
//!
//! Candidates → projection → stop planner, with results cached per request
//! fingerprint. [`plan_fuel_stops`] runs the pipeline once without caching;
//! [`FuelStopEngine`] holds the published catalog and the plan cache for
//! long-lived callers.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{PlanCache, RouteFingerprint};
use crate::candidates::select_candidates;
use crate::catalog::{CatalogHandle, CatalogSnapshot, FuelStation, StationCatalog};
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::path::RoutePath;
use crate::planner::{self, FuelStopPlan, PlanOptions, VehicleProfile};
use crate::projection::project;

/// Plan fuel stops over an already-validated station slice, without caching.
pub fn plan_fuel_stops(
    path: &RoutePath,
    vehicle: &VehicleProfile,
    stations: &[FuelStation],
    config: &PlannerConfig,
) -> Result<FuelStopPlan> {
    config.validate()?;
    let candidates = select_candidates(path, stations, config.corridor_miles, config.margin_factor);
    let projected = project(path, candidates, config.corridor_miles);
    planner::plan(
        &projected,
        path.total_distance(),
        vehicle,
        &config.plan_options(),
    )
}

/// Long-lived planner holding the station catalog and plan cache.
#[derive(Debug)]
pub struct FuelStopEngine {
    config: PlannerConfig,
    catalog: CatalogHandle,
    cache: PlanCache,
}

impl FuelStopEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: PlannerConfig, catalog: StationCatalog) -> Result<Self> {
        config.validate()?;
        let cache = PlanCache::new(config.cache_ttl(), config.cache_capacity);
        Ok(Self {
            config,
            catalog: CatalogHandle::new(catalog),
            cache,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Currently published catalog.
    pub fn catalog(&self) -> CatalogSnapshot {
        self.catalog.snapshot()
    }

    pub fn cache(&self) -> &PlanCache {
        &self.cache
    }

    /// Plan with the configured strategy and refuel policy.
    pub fn plan(&self, path: &RoutePath, vehicle: &VehicleProfile) -> Result<Arc<FuelStopPlan>> {
        self.plan_with_options(path, vehicle, &self.config.plan_options())
    }

    /// Plan with explicit options, sharing the engine's catalog and cache.
    pub fn plan_with_options(
        &self,
        path: &RoutePath,
        vehicle: &VehicleProfile,
        options: &PlanOptions,
    ) -> Result<Arc<FuelStopPlan>> {
        let snapshot = self.catalog.snapshot();
        let corridor = self.config.corridor_miles;
        let key = RouteFingerprint::compute(path, vehicle, options, corridor, snapshot.generation);
        debug!(key = %key, generation = snapshot.generation, "planning request");

        self.cache.get_or_try_insert_with(key, || {
            let candidates =
                snapshot
                    .catalog
                    .index()
                    .select(path, corridor, self.config.margin_factor);
            let projected = project(path, candidates, corridor);
            planner::plan(&projected, path.total_distance(), vehicle, options)
        })
    }

    /// Publish a new catalog. Cached plans for older generations are dropped;
    /// plans already in flight finish against the catalog they started with.
    pub fn reload_catalog(&self, catalog: StationCatalog) -> u64 {
        let generation = self.catalog.replace(catalog);
        self.cache.invalidate_all();
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::geo::Coordinate;
    use crate::validation::ValidationRules;

    fn station(id: i64, lon: f64, price: f64) -> FuelStation {
        FuelStation {
            id,
            name: format!("Station {id}"),
            address: String::new(),
            city: "Somewhere".to_string(),
            state: "TX".to_string(),
            rack_id: None,
            location: Coordinate::new(33.0, lon).expect("valid"),
            price,
        }
    }

    fn path() -> RoutePath {
        // About 580 miles due east across Texas.
        let points = (0..=100)
            .map(|i| Coordinate::new(33.0, -103.0 + f64::from(i) * 0.1).expect("valid"))
            .collect();
        RoutePath::new(points).expect("valid path")
    }

    fn catalog(stations: Vec<FuelStation>) -> StationCatalog {
        StationCatalog::from_stations(stations, &ValidationRules::default()).expect("catalog")
    }

    #[test]
    fn free_function_matches_engine() {
        let stations = vec![station(1, -100.0, 3.10), station(2, -99.0, 2.90)];
        let config = PlannerConfig::default();
        let direct = plan_fuel_stops(&path(), &VehicleProfile::default(), &stations, &config)
            .expect("plan");

        let engine = FuelStopEngine::new(config, catalog(stations)).expect("engine");
        let cached = engine.plan(&path(), &VehicleProfile::default()).expect("plan");
        assert_eq!(*cached, direct);
        assert_eq!(direct.stops.len(), 1);
        assert_eq!(direct.stops[0].station.id, 2);
    }

    #[test]
    fn repeated_requests_hit_the_cache() {
        let engine = FuelStopEngine::new(
            PlannerConfig::default(),
            catalog(vec![station(1, -100.0, 3.10)]),
        )
        .expect("engine");
        let first = engine.plan(&path(), &VehicleProfile::default()).expect("plan");
        let second = engine.plan(&path(), &VehicleProfile::default()).expect("plan");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn reload_changes_results() {
        let engine = FuelStopEngine::new(
            PlannerConfig::default(),
            catalog(vec![station(1, -100.0, 3.10)]),
        )
        .expect("engine");
        let before = engine.plan(&path(), &VehicleProfile::default()).expect("plan");
        assert_eq!(before.stops[0].station.id, 1);

        let generation = engine.reload_catalog(catalog(vec![station(2, -99.5, 3.00)]));
        assert_eq!(generation, 2);
        let after = engine.plan(&path(), &VehicleProfile::default()).expect("plan");
        assert_eq!(after.stops[0].station.id, 2);
    }

    #[test]
    fn empty_catalog_reports_no_stations() {
        let engine =
            FuelStopEngine::new(PlannerConfig::default(), StationCatalog::default()).expect("engine");
        let err = engine
            .plan(&path(), &VehicleProfile::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoFuelStationsFound { .. }));
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PlannerConfig {
            corridor_miles: -1.0,
            ..PlannerConfig::default()
        };
        assert!(FuelStopEngine::new(config, StationCatalog::default()).is_err());
    }
}
