//! Plan command handler: fuel stops along a route file or encoded polyline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use fuelroute_lib::{
    validate_route_distance, Coordinate, FuelStopEngine, PlanStrategy, PlannerConfig,
    RefuelPolicy, RoutePath, VehicleProfile, DEFAULT_POLYLINE_PRECISION,
};

use crate::commands::load_catalog;
use crate::output::{format_plan, OutputFormat};

/// Arguments for the plan command.
#[derive(Debug, Clone, Default)]
pub struct PlanCommandArgs {
    /// JSON route file with `points` or `polyline`.
    pub route: Option<PathBuf>,
    /// Encoded polyline given inline.
    pub polyline: Option<String>,
    pub precision: Option<u32>,
    /// Road distance in miles; overrides the geometric length.
    pub distance: Option<f64>,
    pub mpg: Option<f64>,
    pub range: Option<f64>,
    pub tank: Option<f64>,
    pub strategy: Option<PlanStrategy>,
    pub refuel: Option<RefuelPolicy>,
    pub corridor: Option<f64>,
    pub safety_factor: Option<f64>,
}

/// On-disk route description.
///
/// ```json
/// {"points": [[35.0, -118.0], [35.0, -117.5]], "distance_miles": 28.3}
/// {"polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@", "precision": 5}
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteFile {
    #[serde(default)]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub polyline: Option<String>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub distance_miles: Option<f64>,
}

impl PlanCommandArgs {
    /// Apply command-line overrides on top of environment configuration.
    pub fn apply_to(&self, mut config: PlannerConfig) -> PlannerConfig {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(policy) = self.refuel {
            config.refuel_policy = policy;
        }
        if let Some(corridor) = self.corridor {
            config.corridor_miles = corridor;
        }
        if let Some(factor) = self.safety_factor {
            config.safety_factor = factor;
        }
        config
    }

    /// Vehicle from flags, falling back to the configured default.
    ///
    /// Without `--tank`, a changed efficiency or range implies the tank size.
    pub fn vehicle(&self, default: VehicleProfile) -> Result<VehicleProfile> {
        let mpg = self.mpg.unwrap_or(default.miles_per_gallon);
        let range = self.range.unwrap_or(default.range_miles);
        let vehicle = match (self.tank, self.mpg.is_some() || self.range.is_some()) {
            (Some(tank), _) => VehicleProfile::new(mpg, range, tank)?,
            (None, true) => VehicleProfile::from_efficiency_and_range(mpg, range)?,
            (None, false) => default,
        };
        Ok(vehicle)
    }
}

/// Handle the plan subcommand.
pub fn handle_plan_command(
    stations: &Path,
    format: OutputFormat,
    config: PlannerConfig,
    args: &PlanCommandArgs,
) -> Result<String> {
    let config = args.apply_to(config);
    let vehicle = args.vehicle(config.default_vehicle)?;
    let path = resolve_route(args)?;
    validate_route_distance(path.total_distance())?;

    let catalog = load_catalog(stations, &config.validation)?;
    let catalog_stations = catalog.len();
    debug!(
        stations = catalog_stations,
        points = path.len(),
        distance = path.total_distance(),
        "planning from command line"
    );

    let engine = FuelStopEngine::new(config, catalog)?;
    let plan = engine.plan(&path, &vehicle)?;
    format_plan(&plan, catalog_stations, format)
}

fn resolve_route(args: &PlanCommandArgs) -> Result<RoutePath> {
    match (&args.route, &args.polyline) {
        (Some(_), Some(_)) => bail!("use either --route or --polyline, not both"),
        (None, None) => bail!("a route is required: pass --route <FILE> or --polyline <ENCODED>"),
        (None, Some(encoded)) => build_path(
            None,
            Some(encoded),
            args.precision.unwrap_or(DEFAULT_POLYLINE_PRECISION),
            args.distance,
        ),
        (Some(file), None) => {
            let route = read_route_file(file)?;
            build_path(
                route.points,
                route.polyline.as_deref(),
                args.precision
                    .or(route.precision)
                    .unwrap_or(DEFAULT_POLYLINE_PRECISION),
                args.distance.or(route.distance_miles),
            )
        }
    }
}

/// Read a [`RouteFile`] from disk.
pub fn read_route_file(path: &Path) -> Result<RouteFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read route file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse route file {}", path.display()))
}

fn build_path(
    points: Option<Vec<[f64; 2]>>,
    polyline: Option<&str>,
    precision: u32,
    distance: Option<f64>,
) -> Result<RoutePath> {
    let coordinates = match (points, polyline) {
        (Some(points), None) => points
            .into_iter()
            .map(|[lat, lon]| Coordinate::new(lat, lon))
            .collect::<fuelroute_lib::Result<Vec<_>>>()?,
        (None, Some(encoded)) => RoutePath::from_polyline(encoded, precision)?
            .points()
            .to_vec(),
        (Some(_), Some(_)) => bail!("route file must contain either points or polyline, not both"),
        (None, None) => bail!("route file contains neither points nor polyline"),
    };

    let path = match distance {
        Some(miles) => RoutePath::with_total_distance(coordinates, miles)?,
        None => RoutePath::new(coordinates)?,
    };
    Ok(path)
}
