//! Projection of fuel stations onto a route path.
//!
//! Each station is matched to the path segment it is closest to. The closest
//! point is found in a local equirectangular frame centred on the segment; the
//! offset to it is then measured with haversine.

use crate::catalog::FuelStation;
use crate::geo::{haversine_miles, Coordinate, MILES_PER_DEGREE_LAT};
use crate::path::RoutePath;

/// A station annotated with its position along a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedStation<'a> {
    pub station: &'a FuelStation,
    /// Miles from the route start to the station's projection on the path.
    pub distance_from_start: f64,
    /// Perpendicular distance from the station to the path, in miles.
    pub offset: f64,
    /// Index of the segment the station projects onto.
    pub segment_index: usize,
}

impl ProjectedStation<'_> {
    /// Retail price of the underlying station.
    pub fn price(&self) -> f64 {
        self.station.price
    }
}

#[derive(Debug, Clone, Copy)]
struct SegmentMatch {
    offset: f64,
    along: f64,
    segment_index: usize,
}

/// Project `stations` onto `path`, keeping those within `corridor_miles`.
///
/// Output is sorted by distance from start, ties broken by station id. When the
/// path carries an authoritative total distance that differs from its
/// geometric length, along-route distances are scaled to match it.
pub fn project<'a, I>(path: &RoutePath, stations: I, corridor_miles: f64) -> Vec<ProjectedStation<'a>>
where
    I: IntoIterator<Item = &'a FuelStation>,
{
    let geometric = path.geometric_length();
    let scale = if geometric > 0.0 {
        path.total_distance() / geometric
    } else {
        1.0
    };

    let mut projected: Vec<ProjectedStation<'a>> = stations
        .into_iter()
        .filter_map(|station| {
            let best = closest_segment(path, station.location, corridor_miles)?;
            (best.offset <= corridor_miles).then(|| ProjectedStation {
                station,
                distance_from_start: best.along * scale,
                offset: best.offset,
                segment_index: best.segment_index,
            })
        })
        .collect();

    projected.sort_by(|a, b| {
        a.distance_from_start
            .total_cmp(&b.distance_from_start)
            .then(a.station.id.cmp(&b.station.id))
    });
    projected
}

fn closest_segment(path: &RoutePath, point: Coordinate, corridor_miles: f64) -> Option<SegmentMatch> {
    let points = path.points();
    let cumulative = path.cumulative_distances();

    if points.len() == 1 {
        return Some(SegmentMatch {
            offset: haversine_miles(points[0], point),
            along: 0.0,
            segment_index: 0,
        });
    }

    let mut best: Option<SegmentMatch> = None;
    for (index, pair) in points.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);

        // Latitude gap to the segment's band is a lower bound on the offset.
        let threshold = best.map_or(corridor_miles, |m| m.offset.min(corridor_miles));
        let low = a.latitude.min(b.latitude);
        let high = a.latitude.max(b.latitude);
        let gap = (low - point.latitude).max(point.latitude - high).max(0.0);
        if gap * MILES_PER_DEGREE_LAT > threshold {
            continue;
        }

        let t = segment_parameter(a, b, point);
        let closest = Coordinate {
            latitude: a.latitude + t * (b.latitude - a.latitude),
            longitude: a.longitude + t * (b.longitude - a.longitude),
        };
        let offset = haversine_miles(closest, point);

        if best.map_or(true, |m| offset < m.offset) {
            best = Some(SegmentMatch {
                offset,
                along: cumulative[index] + t * (cumulative[index + 1] - cumulative[index]),
                segment_index: index,
            });
        }
    }
    best
}

/// Position of the closest point on segment `a`-`b` as a fraction in `[0, 1]`.
fn segment_parameter(a: Coordinate, b: Coordinate, point: Coordinate) -> f64 {
    let cos_lat = ((a.latitude + b.latitude) / 2.0).to_radians().cos();
    let dx = (b.longitude - a.longitude) * cos_lat;
    let dy = b.latitude - a.latitude;
    let px = (point.longitude - a.longitude) * cos_lat;
    let py = point.latitude - a.latitude;

    let length_sq = dx * dx + dy * dy;
    if length_sq <= f64::EPSILON * f64::EPSILON {
        return 0.0;
    }
    ((px * dx + py * dy) / length_sq).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    fn station(id: i64, lat: f64, lon: f64) -> FuelStation {
        FuelStation {
            id,
            name: format!("Station {id}"),
            address: String::new(),
            city: String::new(),
            state: "TX".to_string(),
            rack_id: None,
            location: coord(lat, lon),
            price: 3.0,
        }
    }

    fn straight_path() -> RoutePath {
        RoutePath::new(vec![coord(35.0, -102.0), coord(35.0, -101.0), coord(35.0, -100.0)])
            .expect("valid path")
    }

    #[test]
    fn projects_onto_closest_segment() {
        let path = straight_path();
        let stations = [station(1, 35.05, -100.5), station(2, 35.0, -101.5)];
        let projected = project(&path, &stations, 15.0);

        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].station.id, 2);
        assert_eq!(projected[0].segment_index, 0);
        assert_eq!(projected[1].station.id, 1);
        assert_eq!(projected[1].segment_index, 1);

        let half = path.cumulative_distances()[1] / 2.0;
        assert!((projected[0].distance_from_start - half).abs() < 0.5);
        assert!(projected[0].offset < 1e-6);
        // 0.05 degrees of latitude is roughly 3.5 miles.
        assert!((projected[1].offset - 3.45).abs() < 0.1);
    }

    #[test]
    fn drops_stations_outside_corridor() {
        let path = straight_path();
        let stations = [station(1, 35.5, -101.0), station(2, 35.1, -101.0)];
        let projected = project(&path, &stations, 15.0);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].station.id, 2);
    }

    #[test]
    fn stations_beyond_endpoints_clamp_to_ends() {
        let path = straight_path();
        let before = station(1, 35.0, -102.1);
        let after = station(2, 35.0, -99.9);
        let projected = project(&path, [&before, &after], 15.0);

        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].distance_from_start, 0.0);
        assert!((projected[1].distance_from_start - path.total_distance()).abs() < 1e-9);
    }

    #[test]
    fn single_vertex_path_projects_to_start() {
        let path = RoutePath::new(vec![coord(35.0, -100.0)]).expect("valid path");
        let stations = [station(1, 35.1, -100.0)];
        let projected = project(&path, &stations, 15.0);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].distance_from_start, 0.0);
        assert_eq!(projected[0].segment_index, 0);
    }

    #[test]
    fn ties_resolve_to_earlier_segment() {
        // Out-and-back path: the same station is equally close to both legs.
        let path = RoutePath::new(vec![coord(35.0, -101.0), coord(35.0, -100.0), coord(35.0, -101.0)])
            .expect("valid path");
        let stations = [station(1, 35.0, -100.5)];
        let projected = project(&path, &stations, 15.0);
        assert_eq!(projected[0].segment_index, 0);
    }

    #[test]
    fn equal_distances_sort_by_station_id() {
        let path = straight_path();
        let stations = [station(9, 35.01, -101.0), station(3, 34.99, -101.0)];
        let projected = project(&path, &stations, 15.0);
        let ids: Vec<i64> = projected.iter().map(|p| p.station.id).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[test]
    fn authoritative_distance_scales_positions() {
        let points = vec![coord(35.0, -102.0), coord(35.0, -100.0)];
        let geometric = RoutePath::new(points.clone()).expect("valid path").total_distance();
        let path = RoutePath::with_total_distance(points, geometric * 1.2).expect("valid path");

        let stations = [station(1, 35.0, -100.0)];
        let projected = project(&path, &stations, 15.0);
        assert!((projected[0].distance_from_start - geometric * 1.2).abs() < 1e-6);
    }
}
