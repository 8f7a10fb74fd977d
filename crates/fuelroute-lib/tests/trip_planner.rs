mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{fixture_catalog, fixture_route};
use fuelroute_lib::{
    Coordinate, Error, FuelStopEngine, Geocoder, PlannerConfig, Result, RetryPolicy,
    RouteGeometry, RoutePath, RouteProvider, TripPlanner, VehicleProfile,
};

/// Geocoder over a fixed table that fails the first `outages` calls.
struct TableGeocoder {
    places: HashMap<&'static str, Coordinate>,
    outages: usize,
    calls: AtomicUsize,
}

impl TableGeocoder {
    fn new(outages: usize) -> Self {
        let places = HashMap::from([
            ("Barstow, CA", Coordinate::new(35.0, -118.0).expect("valid")),
            ("Amarillo, TX", Coordinate::new(35.0, -100.0).expect("valid")),
            ("Kingman, AZ", Coordinate::new(35.0, -114.0).expect("valid")),
        ]);
        Self {
            places,
            outages,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Geocoder for TableGeocoder {
    fn geocode(&self, location: &str) -> Result<Coordinate> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.outages {
            return Err(Error::RouteServiceUnavailable {
                service: "geocode".to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        self.places
            .get(location)
            .copied()
            .ok_or_else(|| Error::LocationNotFound {
                location: location.to_string(),
            })
    }
}

/// Router that follows the fixture interstate, optionally always failing.
struct InterstateRouter {
    down: bool,
    calls: Arc<AtomicUsize>,
}

impl InterstateRouter {
    fn up() -> Self {
        Self {
            down: false,
            calls: Arc::default(),
        }
    }

    fn down() -> Self {
        Self {
            down: true,
            calls: Arc::default(),
        }
    }
}

impl RouteProvider for InterstateRouter {
    fn name(&self) -> &str {
        "interstate"
    }

    fn route(&self, from: Coordinate, to: Coordinate) -> Result<RouteGeometry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down {
            return Err(Error::RouteServiceUnavailable {
                service: self.name().to_string(),
                message: "timeout".to_string(),
            });
        }
        let points: Vec<Coordinate> = fixture_route()
            .points()
            .iter()
            .copied()
            .filter(|p| p.longitude >= from.longitude && p.longitude <= to.longitude)
            .collect();
        if points.is_empty() {
            return Err(Error::NoRouteFound {
                start: format!("{from:?}"),
                goal: format!("{to:?}"),
            });
        }
        let path = RoutePath::new(points)?;
        let duration_seconds = path.total_distance() / 65.0 * 3600.0;
        Ok(RouteGeometry {
            path,
            duration_seconds,
        })
    }
}

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        multiplier: 2,
        jitter_ratio: 0.0,
    }
}

fn engine() -> Arc<FuelStopEngine> {
    Arc::new(FuelStopEngine::new(PlannerConfig::default(), fixture_catalog()).expect("engine"))
}

#[test]
fn plans_trip_across_the_southwest() {
    let planner = TripPlanner::new(TableGeocoder::new(0), InterstateRouter::up(), engine())
        .with_retry_policy(quick_retry());

    let trip = planner
        .plan_trip("Barstow, ca", "Amarillo, tx", None)
        .expect("trip");
    assert_eq!(trip.start.query, "Barstow, CA");
    assert_eq!(trip.finish.query, "Amarillo, TX");
    assert!(trip.distance_miles > 1000.0);
    assert!(trip.duration_seconds > 0.0);

    let ids: Vec<_> = trip.fuel.stops.iter().map(|s| s.station.id).collect();
    assert_eq!(ids, vec![4, 7]);
}

#[test]
fn geocoder_outages_are_retried() {
    let geocoder = TableGeocoder::new(2);
    let planner = TripPlanner::new(geocoder, InterstateRouter::up(), engine())
        .with_retry_policy(quick_retry());

    let trip = planner
        .plan_trip("Barstow, CA", "Kingman, AZ", None)
        .expect("trip after retries");
    assert!(trip.fuel.stops.is_empty());
}

#[test]
fn persistent_router_outage_gives_up_after_max_attempts() {
    let router = InterstateRouter::down();
    let calls = Arc::clone(&router.calls);
    let planner = TripPlanner::new(TableGeocoder::new(0), router, engine())
        .with_retry_policy(quick_retry());

    let err = planner
        .plan_trip("Barstow, CA", "Amarillo, TX", None)
        .unwrap_err();
    assert!(matches!(err, Error::RouteServiceUnavailable { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn unknown_locations_are_not_retried() {
    let geocoder = TableGeocoder::new(0);
    let planner = TripPlanner::new(geocoder, InterstateRouter::up(), engine())
        .with_retry_policy(quick_retry());

    let err = planner
        .plan_trip("Atlantis, GA", "Amarillo, TX", None)
        .unwrap_err();
    assert!(matches!(err, Error::LocationNotFound { .. }));
}

#[test]
fn invalid_location_is_rejected_before_geocoding() {
    let planner = TripPlanner::new(TableGeocoder::new(0), InterstateRouter::up(), engine());
    let err = planner.plan_trip("  ", "Amarillo, TX", None).unwrap_err();
    assert!(matches!(err, Error::InvalidLocation { .. }));
}

#[test]
fn vehicle_override_changes_the_plan() {
    let planner = TripPlanner::new(TableGeocoder::new(0), InterstateRouter::up(), engine())
        .with_retry_policy(quick_retry());
    let long_range = VehicleProfile::new(12.0, 1200.0, 100.0).expect("vehicle");

    let trip = planner
        .plan_trip("Barstow, CA", "Amarillo, TX", Some(&long_range))
        .expect("trip");
    assert!(trip.fuel.is_direct());
}

#[test]
fn concurrent_trips_share_cached_plans() {
    let planner = TripPlanner::new(TableGeocoder::new(0), InterstateRouter::up(), engine())
        .with_retry_policy(quick_retry());

    let plans: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|_| scope.spawn(|| planner.plan_trip("Barstow, CA", "Amarillo, TX", None)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread").expect("trip"))
            .collect()
    });

    for trip in &plans[1..] {
        assert!(Arc::ptr_eq(&plans[0].fuel, &trip.fuel));
    }
    assert_eq!(planner.engine().cache().len(), 1);
}
