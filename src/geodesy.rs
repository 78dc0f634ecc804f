//! WGS-84 geodesy primitives: great-circle distance, bearing, interpolation
//! and extrapolation along a polyline.
//!
//! These are not part of the decoder's public contract — the decoder only
//! ever calls [`Map`](crate::Map) methods — but [`Route::coordinates`](crate::Route::coordinates)
//! needs *some* geodesy backend to turn a fraction-along-a-line into an
//! actual coordinate, and this module is the one this crate ships. A `Map`
//! implementation itself is free to use whatever geospatial backend it
//! wants for nomination (the `reference-map` feature's implementation uses
//! this same module for consistency). Functions here never fail: invalid
//! polylines (fewer than two points) are a caller error, everything else
//! clamps or degenerates rather than returning a `Result`.

use geo::{
    Bearing as GeoBearing, Distance, Haversine, InterpolatableLine, LineString,
    Point as GeoPoint, coord,
};

use crate::model::{Bearing, Coordinate, Length};

fn to_geo_point(coordinate: Coordinate) -> GeoPoint {
    GeoPoint::new(coordinate.lon, coordinate.lat)
}

fn to_line_string(polyline: &[Coordinate]) -> LineString {
    LineString::from(
        polyline
            .iter()
            .map(|c| coord! { x: c.lon, y: c.lat })
            .collect::<Vec<_>>(),
    )
}

/// Great-circle distance between two coordinates, in meters.
pub fn distance(a: Coordinate, b: Coordinate) -> Length {
    Length::from_meters(Haversine.distance(to_geo_point(a), to_geo_point(b)))
}

/// Initial bearing from `a` towards `b`, in degrees `[0, 360)`.
pub fn bearing(a: Coordinate, b: Coordinate) -> Bearing {
    Bearing::from_degrees(Haversine.bearing(to_geo_point(a), to_geo_point(b)))
}

/// Sums the great-circle length of every consecutive pair of coordinates in
/// the polyline. Returns zero for a polyline with fewer than two points.
pub fn line_string_length(polyline: &[Coordinate]) -> Length {
    polyline
        .windows(2)
        .map(|pair| distance(pair[0], pair[1]))
        .sum()
}

/// The coordinate `meters` along `polyline`, measured from its first point.
/// Clamps to the terminal coordinate once `meters` reaches or exceeds the
/// polyline's total length. `meters` may be negative, in which case the
/// first coordinate is returned.
pub fn interpolate(polyline: &[Coordinate], meters: Length) -> Coordinate {
    let Some(&first) = polyline.first() else {
        return Coordinate::default();
    };
    if polyline.len() < 2 {
        return first;
    }
    if meters.meters() <= 0.0 {
        return first;
    }

    let total = line_string_length(polyline);
    if total.is_zero() {
        return first;
    }
    let ratio = (meters.meters() / total.meters()).clamp(0.0, 1.0);

    match to_line_string(polyline).point_at_ratio_from_start(&Haversine, ratio) {
        Some(point) => Coordinate {
            lon: point.x(),
            lat: point.y(),
        },
        None => *polyline.last().unwrap(),
    }
}

/// The coordinate `meters` away from `coord` in the direction `bearing_degrees`
/// (clockwise from true North).
pub fn extrapolate(coord: Coordinate, meters: Length, bearing_degrees: f64) -> Coordinate {
    use geo::Destination;
    let destination = Haversine.destination(to_geo_point(coord), bearing_degrees, meters.meters());
    Coordinate {
        lon: destination.x(),
        lat: destination.y(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: Coordinate = Coordinate {
        lon: 13.405,
        lat: 52.52,
    };
    const POTSDAM: Coordinate = Coordinate {
        lon: 13.0645,
        lat: 52.3906,
    };

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(distance(BERLIN, POTSDAM), distance(POTSDAM, BERLIN));
        assert!(distance(BERLIN, POTSDAM).meters() > 20_000.0);
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert!(distance(BERLIN, BERLIN).is_zero());
    }

    #[test]
    fn interpolate_clamps_to_polyline_end() {
        let polyline = [BERLIN, POTSDAM];
        let total = line_string_length(&polyline);
        let beyond = interpolate(&polyline, total + Length::from_meters(1000.0));
        assert_eq!(beyond, POTSDAM);
    }

    #[test]
    fn interpolate_at_zero_is_start() {
        let polyline = [BERLIN, POTSDAM];
        assert_eq!(interpolate(&polyline, Length::ZERO), BERLIN);
    }

    #[test]
    fn line_string_length_of_single_point_is_zero() {
        assert!(line_string_length(&[BERLIN]).is_zero());
    }

    #[test]
    fn extrapolate_then_distance_back_roundtrips() {
        let moved = extrapolate(BERLIN, Length::from_meters(500.0), 90.0);
        let back = distance(BERLIN, moved);
        assert!((back.meters() - 500.0).abs() < 1.0);
    }
}
