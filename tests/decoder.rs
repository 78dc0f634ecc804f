mod support;

use openlr_decoder::{
    Bearing, Coordinate, DecodeError, DecoderConfig, Fow, Frc, Length, Line, LineAttributes,
    LocationReference, Map, NullObserver, Offset, Offsets, PathAttributes, Point, RecordingObserver,
    decode,
};

fn anchor(coordinate: Coordinate, bearing_degrees: f64, dnp: Option<(Frc, f64)>) -> Point {
    Point {
        coordinate,
        line: LineAttributes {
            frc: Frc::Frc2,
            fow: Fow::SingleCarriageway,
            bearing: Bearing::from_degrees(bearing_degrees),
        },
        path: dnp.map(|(lfrcnp, dnp)| PathAttributes {
            lfrcnp,
            dnp: Length::from_meters(dnp),
        }),
    }
}

/// spec.md §8 scenario 3: the three-segment path's polyline with a quarter
/// trimmed off the head and three quarters off the tail.
#[test]
fn offsets_trim_the_head_and_tail_of_the_route() {
    let map = support::three_segment_path();
    let config = DecoderConfig::default();

    let n1 = map.get_node_coordinate(1).unwrap();
    let n2 = map.get_node_coordinate(2).unwrap();
    let n3 = map.get_node_coordinate(3).unwrap();
    let n4 = map.get_node_coordinate(4).unwrap();

    let dnp_a = support::distance(n1, n2) + support::distance(n2, n3);
    let dnp_b = support::distance(n3, n4);

    let reference = LocationReference::Line(Line {
        points: vec![
            anchor(n1, 90.0, Some((Frc::Frc2, dnp_a))),
            anchor(n3, 170.0, Some((Frc::Frc2, dnp_b))),
            anchor(n4, 320.0, None),
        ],
        offsets: Offsets {
            pos: Offset::from_fraction(0.25),
            neg: Offset::from_fraction(0.75),
        },
    });

    let mut observer = NullObserver;
    let decoded = decode(&reference, &map, &config, &mut observer).unwrap();
    let openlr_decoder::DecodedLocation::Line(location) = decoded else {
        panic!("expected a line location");
    };

    assert_eq!(location.segments(), vec![1, 3, 4]);
    let coordinates = location.coordinates(&map).unwrap();
    assert_eq!(coordinates.len(), 4);

    // trimmed 25% off the head of line 1: the first coordinate has moved on
    // from n1 towards n2, but the interior nodes are untouched.
    let first = coordinates[0];
    assert!(first.lon > n1.lon && first.lon < n2.lon);
    assert!((first.lat - n1.lat).abs() < 1e-4);
    assert_eq!(coordinates[1], n2);
    assert_eq!(coordinates[2], n3);
}

/// spec.md §8 scenario 4: both anchors project onto the interior of the same
/// segment, with opposing declared bearings (the second anchor's bearing is
/// sampled walking backward towards the first).
#[test]
fn mid_line_location_resolves_to_a_single_segment() {
    let map = support::mid_line_segment();
    let config = DecoderConfig::default();

    let start = map.get_node_coordinate(1).unwrap();
    let end = map.get_node_coordinate(2).unwrap();
    let a = Coordinate {
        lon: start.lon + (end.lon - start.lon) * 0.3,
        lat: start.lat,
    };
    let b = Coordinate {
        lon: start.lon + (end.lon - start.lon) * 0.7,
        lat: start.lat,
    };
    let dnp = support::distance(a, b);

    let reference = LocationReference::Line(Line {
        points: vec![
            anchor(a, 90.0, Some((Frc::Frc2, dnp))),
            anchor(b, 270.0, None),
        ],
        offsets: Offsets::default(),
    });

    let mut observer = NullObserver;
    let decoded = decode(&reference, &map, &config, &mut observer).unwrap();
    let openlr_decoder::DecodedLocation::Line(location) = decoded else {
        panic!("expected a line location");
    };

    assert_eq!(location.segments(), vec![100]);
    let full_length = map.get_line_length(100).unwrap();
    let route_length = location.route.length(&map).unwrap();
    assert!(route_length.meters() < full_length.meters());
}

/// spec.md §8 scenario 6: a zero-tolerance bearing pre-filter rejects every
/// candidate before scoring, and the observer records each rejection.
#[test]
fn strict_bearing_threshold_rejects_every_candidate() {
    let map = support::three_segment_path();
    let config = DecoderConfig {
        max_bear_deviation: Some(0.0),
        ..Default::default()
    };

    let n1 = map.get_node_coordinate(1).unwrap();
    let anchor = Point {
        coordinate: n1,
        line: LineAttributes {
            frc: Frc::Frc0,
            fow: Fow::SingleCarriageway,
            // line 1 runs due east (bearing ~90 degrees); declaring a
            // bearing that is off by a few degrees must be enough to fail a
            // zero-tolerance filter.
            bearing: Bearing::from_degrees(95.0),
        },
        path: None,
    };

    let mut observer = RecordingObserver::new();
    let candidates =
        openlr_decoder::nominate(&map, &anchor, 0, false, &config, &mut observer).unwrap();
    assert!(candidates.is_empty());
    assert!(!observer.rejected_candidates.is_empty());

    let first = Point {
        path: Some(PathAttributes {
            lfrcnp: Frc::Frc2,
            dnp: Length::from_meters(300.0),
        }),
        ..anchor
    };
    let result = decode(
        &LocationReference::Line(Line {
            points: vec![
                first,
                Point {
                    coordinate: map.get_node_coordinate(4).unwrap(),
                    line: LineAttributes {
                        frc: Frc::Frc2,
                        fow: Fow::SingleCarriageway,
                        bearing: Bearing::from_degrees(320.0),
                    },
                    path: None,
                },
            ],
            offsets: Offsets::default(),
        }),
        &map,
        &config,
        &mut NullObserver,
    );
    assert!(matches!(
        result,
        Err(DecodeError::NoCandidates { anchor_index: 0 })
    ));
}
