//! A small road network shared by the scenario tests, built on
//! [`openlr_decoder::ReferenceMap`] rather than duplicating a hand-rolled
//! `Map` here.

use geo::{Distance, Haversine};
use openlr_decoder::{Coordinate, Fow, Frc, ReferenceMap};

/// Great-circle distance, for picking realistic `dnp` values when building a
/// test reference — the decoder's own geodesy helpers are crate-private.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(geo::Point::new(a.lon, a.lat), geo::Point::new(b.lon, b.lat))
}

/// spec.md §8 scenario 1's three-segment path: nodes 1-4 joined by lines 1,
/// 3 and 4, plus an unused decoy (line 2) off node 2.
pub fn three_segment_path() -> ReferenceMap<i64, u64> {
    let mut map = ReferenceMap::new();
    let n1 = Coordinate { lon: 13.41, lat: 52.525 };
    let n2 = Coordinate { lon: 13.414, lat: 52.525 };
    let n3 = Coordinate { lon: 13.4145, lat: 52.529 };
    let n4 = Coordinate { lon: 13.416, lat: 52.525 };
    let n5 = Coordinate { lon: 13.414, lat: 52.521 };
    map.insert_node(1, n1);
    map.insert_node(2, n2);
    map.insert_node(3, n3);
    map.insert_node(4, n4);
    map.insert_node(5, n5);
    map.insert_line(1, 1, 2, Frc::Frc0, Fow::SingleCarriageway, vec![n1, n2]);
    map.insert_line(2, 2, 5, Frc::Frc4, Fow::SlipRoad, vec![n2, n5]);
    map.insert_line(3, 2, 3, Frc::Frc2, Fow::SingleCarriageway, vec![n2, n3]);
    map.insert_line(4, 3, 4, Frc::Frc2, Fow::SingleCarriageway, vec![n3, n4]);
    map
}

/// spec.md §8 scenario 4: a single straight east-running line long enough
/// that both anchors project onto its interior.
pub fn mid_line_segment() -> ReferenceMap<i64, u64> {
    let mut map = ReferenceMap::new();
    let start = Coordinate { lon: 13.400, lat: 52.500 };
    let end = Coordinate { lon: 13.404, lat: 52.500 };
    map.insert_node(1, start);
    map.insert_node(2, end);
    map.insert_line(100, 1, 2, Frc::Frc2, Fow::SingleCarriageway, vec![start, end]);
    map
}
