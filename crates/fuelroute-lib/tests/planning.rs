mod common;

use common::{along, northbound_path, seeded_rng, station_at, stations_every};
use fuelroute_lib::{
    plan_fuel_stops, Error, FuelStation, FuelStopPlan, PlanStrategy, PlannerConfig,
    RefuelPolicy, VehicleProfile,
};
use rand::Rng;

fn config() -> PlannerConfig {
    PlannerConfig::default()
}

fn with_strategy(strategy: PlanStrategy) -> PlannerConfig {
    PlannerConfig {
        strategy,
        ..PlannerConfig::default()
    }
}

fn assert_legs_within(plan: &FuelStopPlan, usable_range: f64) {
    let mut previous = 0.0;
    for stop in &plan.stops {
        assert!(
            stop.distance_from_start - previous <= usable_range + 1e-6,
            "leg ending at mile {} exceeds usable range",
            stop.distance_from_start
        );
        previous = stop.distance_from_start;
    }
    assert!(plan.summary.total_distance - previous <= usable_range + 1e-6);
}

#[test]
fn short_trip_within_usable_range_needs_no_stops() {
    let path = northbound_path(380.0, 20.0);
    let stations = stations_every(10.0, 380.0, |_| 3.50);
    let plan = plan_fuel_stops(&path, &VehicleProfile::default(), &stations, &config())
        .expect("plan");
    assert!(plan.stops.is_empty());
    assert_eq!(plan.summary.total_cost, 0.0);
}

#[test]
fn shorter_range_needs_one_stop() {
    let path = northbound_path(380.0, 20.0);
    let stations = stations_every(10.0, 380.0, |_| 3.50);
    let vehicle = VehicleProfile::new(10.0, 300.0, 30.0).expect("valid vehicle");
    let plan = plan_fuel_stops(&path, &vehicle, &stations, &config()).expect("plan");

    assert_eq!(plan.stops.len(), 1);
    assert_legs_within(&plan, 270.0);
}

#[test]
fn cross_country_trip_with_uniform_prices_takes_six_stops() {
    let path = northbound_path(2789.0, 25.0);
    let stations = stations_every(10.0, 2789.0, |_| 3.25);
    let plan = plan_fuel_stops(&path, &VehicleProfile::default(), &stations, &config())
        .expect("plan");

    assert_eq!(plan.stops.len(), 6);
    assert_eq!(plan.summary.stop_count, 6);
    assert_legs_within(&plan, 450.0);

    // Uniform prices: greedy always takes the farthest reachable station.
    let first = plan.stops[0].distance_from_start;
    assert!(first > 430.0 && first <= 450.0 + 1e-6, "first stop at {first}");
}

#[test]
fn no_stations_near_route_is_reported() {
    let path = northbound_path(900.0, 30.0);
    // Two degrees east of the meridian is over 100 miles off route.
    let far_away: Vec<FuelStation> = (1..=9)
        .map(|i| {
            let mut station = station_at(i, i as f64 * 100.0, 3.0);
            station.location = along(i as f64 * 100.0, 2.0);
            station
        })
        .collect();

    let err = plan_fuel_stops(&path, &VehicleProfile::default(), &far_away, &config())
        .unwrap_err();
    assert!(matches!(err, Error::NoFuelStationsFound { .. }));
}

#[test]
fn gap_between_stations_is_insufficient_range() {
    let path = northbound_path(1200.0, 30.0);
    let stations = vec![station_at(1, 200.0, 3.0), station_at(2, 800.0, 3.0)];
    let err = plan_fuel_stops(&path, &VehicleProfile::default(), &stations, &config())
        .unwrap_err();
    match err {
        Error::InsufficientRange { position, .. } => assert!((position - 200.0).abs() < 1e-6),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn stations_outside_corridor_are_ignored() {
    let path = northbound_path(600.0, 30.0);
    let mut cheap_but_far = station_at(1, 300.0, 1.99);
    cheap_but_far.location = along(300.0, 0.5);
    let near = station_at(2, 320.0, 3.99);

    let plan = plan_fuel_stops(
        &path,
        &VehicleProfile::default(),
        &[cheap_but_far, near],
        &config(),
    )
    .expect("plan");
    assert_eq!(plan.stops.len(), 1);
    assert_eq!(plan.stops[0].station.id, 2);
    assert_eq!(plan.summary.stations_considered, 1);
}

#[test]
fn plans_are_deterministic() {
    let path = northbound_path(1500.0, 25.0);
    let stations = stations_every(15.0, 1500.0, |i| 3.0 + ((i * 7) % 11) as f64 * 0.05);
    let first = plan_fuel_stops(&path, &VehicleProfile::default(), &stations, &config())
        .expect("plan");
    let mut reversed = stations.clone();
    reversed.reverse();
    let second = plan_fuel_stops(&path, &VehicleProfile::default(), &reversed, &config())
        .expect("plan");
    assert_eq!(first, second);
}

#[test]
fn fill_tank_policy_buys_at_least_as_much_fuel() {
    let path = northbound_path(1500.0, 25.0);
    let stations = stations_every(20.0, 1500.0, |i| 3.0 + (i % 5) as f64 * 0.1);
    let minimum = plan_fuel_stops(&path, &VehicleProfile::default(), &stations, &config())
        .expect("plan");
    let fill = plan_fuel_stops(
        &path,
        &VehicleProfile::default(),
        &stations,
        &PlannerConfig {
            refuel_policy: RefuelPolicy::FillTank,
            ..PlannerConfig::default()
        },
    )
    .expect("plan");

    let stop_ids = |plan: &FuelStopPlan| plan.stops.iter().map(|s| s.station.id).collect::<Vec<_>>();
    assert_eq!(stop_ids(&minimum), stop_ids(&fill));
    assert!(fill.summary.total_gallons >= minimum.summary.total_gallons - 1e-9);
}

#[test]
fn optimal_never_costs_more_than_greedy() {
    let mut rng = seeded_rng(0x5eed);
    for _ in 0..25 {
        let length = rng.random_range(500.0..2500.0);
        let path = northbound_path(length, 25.0);
        let mut stations = Vec::new();
        let mut mile = rng.random_range(5.0..60.0);
        let mut id = 1;
        while mile < length {
            stations.push(station_at(id, mile, rng.random_range(2.8..4.6)));
            id += 1;
            mile += rng.random_range(5.0..120.0);
        }

        let greedy = plan_fuel_stops(
            &path,
            &VehicleProfile::default(),
            &stations,
            &with_strategy(PlanStrategy::Greedy),
        );
        let optimal = plan_fuel_stops(
            &path,
            &VehicleProfile::default(),
            &stations,
            &with_strategy(PlanStrategy::Optimal),
        );

        match (greedy, optimal) {
            (Ok(greedy), Ok(optimal)) => {
                assert_legs_within(&greedy, 450.0);
                assert_legs_within(&optimal, 450.0);
                assert!(
                    optimal.summary.total_cost <= greedy.summary.total_cost + 1e-6,
                    "optimal {} > greedy {}",
                    optimal.summary.total_cost,
                    greedy.summary.total_cost
                );
                assert_eq!(optimal.summary.strategy, PlanStrategy::Optimal);
            }
            (Err(greedy), Err(optimal)) => {
                assert_eq!(
                    std::mem::discriminant(&greedy),
                    std::mem::discriminant(&optimal)
                );
            }
            (greedy, optimal) => panic!(
                "strategies disagree on feasibility: greedy {:?}, optimal {:?}",
                greedy.map(|p| p.summary.stop_count),
                optimal.map(|p| p.summary.stop_count)
            ),
        }
    }
}

#[test]
fn every_plan_respects_the_range_invariant() {
    let mut rng = seeded_rng(42);
    for _ in 0..40 {
        let length = rng.random_range(100.0..3000.0);
        let range = rng.random_range(150.0..800.0);
        let vehicle = VehicleProfile::from_efficiency_and_range(8.0, range).expect("valid vehicle");
        let path = northbound_path(length, 40.0);
        let spacing = rng.random_range(10.0..60.0);
        let stations = stations_every(spacing, length, |i| 3.0 + (i % 3) as f64 * 0.2);

        if let Ok(plan) = plan_fuel_stops(&path, &vehicle, &stations, &config()) {
            assert_legs_within(&plan, range * 0.9);
            for stop in &plan.stops {
                assert!(stop.gallons <= vehicle.tank_capacity_gallons + 1e-9);
                assert!((stop.cost - stop.gallons * stop.station.price).abs() < 1e-9);
            }
        }
    }
}
