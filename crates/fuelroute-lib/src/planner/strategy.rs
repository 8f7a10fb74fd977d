//! Stop selection strategies.
//!
//! A [`StopStrategy`] decides *where* to stop; how much fuel is bought at each
//! stop is decided afterwards by the refuel policy. Strategies receive the
//! projected stations sorted by distance from start and return indices into
//! that slice, in driving order.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{Error, Result};
use crate::projection::ProjectedStation;

use super::PlanStrategy;

/// Costs closer than this are treated as equal by the optimal strategy.
const COST_EPSILON: f64 = 1e-9;

/// Parameters shared by every strategy for a single plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopSearch {
    pub total_distance: f64,
    /// Vehicle range after the safety factor is applied.
    pub usable_range: f64,
    pub miles_per_gallon: f64,
    pub tank_capacity_gallons: f64,
}

impl StopSearch {
    fn failure(&self, stations: &[ProjectedStation<'_>], position: f64) -> Error {
        if stations.is_empty() {
            Error::NoFuelStationsFound {
                route_distance: self.total_distance,
            }
        } else {
            Error::InsufficientRange {
                route_distance: self.total_distance,
                usable_range: self.usable_range,
                position,
            }
        }
    }

    /// Gallons needed for a leg, bounded by the tank.
    fn leg_gallons(&self, leg: f64) -> f64 {
        (leg / self.miles_per_gallon).min(self.tank_capacity_gallons)
    }
}

/// Trait for stop selection strategies.
pub trait StopStrategy: Send + Sync {
    /// The strategy identifier.
    fn strategy(&self) -> PlanStrategy;

    /// Choose stops among `stations` (sorted by distance from start).
    ///
    /// Returns indices into `stations` in driving order, or
    /// `NoFuelStationsFound` / `InsufficientRange` when the destination
    /// cannot be reached.
    fn select_stops(&self, stations: &[ProjectedStation<'_>], search: &StopSearch) -> Result<Vec<usize>>;
}

/// Cheapest-reachable-station strategy.
///
/// From the current position, picks the cheapest station within usable range,
/// preferring the farthest one on a price tie and then the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl StopStrategy for GreedyStrategy {
    fn strategy(&self) -> PlanStrategy {
        PlanStrategy::Greedy
    }

    fn select_stops(&self, stations: &[ProjectedStation<'_>], search: &StopSearch) -> Result<Vec<usize>> {
        let mut stops = Vec::new();
        let mut position = 0.0;
        let mut cursor = 0;

        while position + search.usable_range < search.total_distance {
            let reach = position + search.usable_range;
            let mut best: Option<usize> = None;

            for (index, candidate) in stations.iter().enumerate().skip(cursor) {
                if candidate.distance_from_start <= position {
                    continue;
                }
                if candidate.distance_from_start > reach {
                    break;
                }
                let better = match best {
                    None => true,
                    Some(current) => greedy_order(candidate, &stations[current]) == Ordering::Less,
                };
                if better {
                    best = Some(index);
                }
            }

            let Some(index) = best else {
                return Err(search.failure(stations, position));
            };

            let chosen = &stations[index];
            debug!(
                station_id = chosen.station.id,
                distance_from_start = chosen.distance_from_start,
                price = chosen.station.price,
                "selected fuel stop"
            );
            stops.push(index);
            position = chosen.distance_from_start;
            cursor = index + 1;
        }

        Ok(stops)
    }
}

/// Lower price first, then farther along the route, then lower id.
fn greedy_order(a: &ProjectedStation<'_>, b: &ProjectedStation<'_>) -> Ordering {
    a.station
        .price
        .total_cmp(&b.station.price)
        .then(b.distance_from_start.total_cmp(&a.distance_from_start))
        .then(a.station.id.cmp(&b.station.id))
}

/// Minimum-cost strategy.
///
/// Dynamic programming over start → stations → destination, where a leg exists
/// when it is positive and no longer than the usable range. The cost of a leg
/// is the fuel bought at its origin for that leg (free from the start, since the
/// tank starts full). Ties on cost prefer fewer stops, then later stations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimalStrategy;

#[derive(Debug, Clone, Copy)]
struct Label {
    cost: f64,
    stops: usize,
    previous: Option<usize>,
}

impl Label {
    fn improves_on(&self, other: &Label) -> bool {
        if self.cost < other.cost - COST_EPSILON {
            return true;
        }
        // Equal cost and stops: candidates arrive in driving order, so the
        // later predecessor wins.
        (self.cost - other.cost).abs() <= COST_EPSILON && self.stops <= other.stops
    }
}

impl StopStrategy for OptimalStrategy {
    fn strategy(&self) -> PlanStrategy {
        PlanStrategy::Optimal
    }

    fn select_stops(&self, stations: &[ProjectedStation<'_>], search: &StopSearch) -> Result<Vec<usize>> {
        if search.total_distance <= search.usable_range {
            return Ok(Vec::new());
        }

        // Node 0 is the start; node i + 1 is stations[i].
        let position = |node: usize| {
            if node == 0 {
                0.0
            } else {
                stations[node - 1].distance_from_start
            }
        };
        let price = |node: usize| {
            if node == 0 {
                0.0
            } else {
                stations[node - 1].station.price
            }
        };

        let mut labels: Vec<Option<Label>> = vec![None; stations.len() + 1];
        labels[0] = Some(Label {
            cost: 0.0,
            stops: 0,
            previous: None,
        });

        let mut window_start = 0;
        for node in 1..=stations.len() {
            let here = position(node);
            while here - position(window_start) > search.usable_range {
                window_start += 1;
            }

            let mut best: Option<Label> = None;
            for from in window_start..node {
                let leg = here - position(from);
                if leg <= 0.0 {
                    continue;
                }
                let Some(origin) = labels[from] else {
                    continue;
                };
                let candidate = Label {
                    cost: origin.cost + price(from) * search.leg_gallons(leg),
                    stops: origin.stops + 1,
                    previous: Some(from),
                };
                if best.map_or(true, |current| candidate.improves_on(&current)) {
                    best = Some(candidate);
                }
            }
            labels[node] = best;
        }

        let mut arrival: Option<Label> = None;
        let mut farthest = 0.0_f64;
        for (node, label) in labels.iter().enumerate() {
            let Some(label) = label else {
                continue;
            };
            let from = position(node);
            farthest = farthest.max(from);
            let leg = search.total_distance - from;
            if leg <= 0.0 || leg > search.usable_range {
                continue;
            }
            let candidate = Label {
                cost: label.cost + price(node) * search.leg_gallons(leg),
                stops: label.stops,
                previous: Some(node),
            };
            if arrival.map_or(true, |current| candidate.improves_on(&current)) {
                arrival = Some(candidate);
            }
        }

        let Some(arrival) = arrival else {
            return Err(search.failure(stations, farthest));
        };

        let mut stops = Vec::with_capacity(arrival.stops);
        let mut node = arrival.previous;
        while let Some(current) = node.filter(|&n| n > 0) {
            stops.push(current - 1);
            node = labels[current].and_then(|label| label.previous);
        }
        stops.reverse();

        debug!(
            stops = stops.len(),
            fuel_cost = arrival.cost,
            "selected minimum-cost fuel stops"
        );
        Ok(stops)
    }
}

/// Return the stop strategy for the requested mode.
pub fn select_strategy(strategy: PlanStrategy) -> Box<dyn StopStrategy> {
    match strategy {
        PlanStrategy::Greedy => Box::new(GreedyStrategy),
        PlanStrategy::Optimal => Box::new(OptimalStrategy),
    }
}
