//! Top-level decoder: coordinates nomination, pairwise matching and
//! backtracking over a whole [`LocationReference`], then applies the head
//! and tail offsets to produce the final [`DecodedLocation`].

use tracing::{debug, warn};

use crate::candidates::{self, Candidate};
use crate::error::{DecodeError, RouteMatchError};
use crate::graph::Map;
use crate::location::{DecodedLocation, LineLocation, PoiLocation, PointAlongLineLocation};
use crate::matcher::{self, LengthBounds, MatchOutcome};
use crate::model::{self, Frc, Length, LocationReference, Offsets};
use crate::observer::{Observer, ObservedCandidate};
use crate::path::{self, Route};
use crate::scoring::ScoringWeights;

/// Identity `tolerated_lfrc` map: every anchor's LFRCNP is honored exactly as
/// declared, with no extra leeway.
pub const IDENTITY_TOLERATED_LFRC: [Frc; 8] = [
    Frc::Frc0,
    Frc::Frc1,
    Frc::Frc2,
    Frc::Frc3,
    Frc::Frc4,
    Frc::Frc5,
    Frc::Frc6,
    Frc::Frc7,
];

/// Every tunable knob the decoder consults, with the defaults from spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    pub search_radius: Length,
    pub max_dnp_deviation: f64,
    pub tolerated_dnp_dev: Length,
    pub min_score: f64,
    /// Loosest (numerically highest) FRC a route may use between two anchors,
    /// indexed by the declared LFRCNP of the anchor before the pair.
    pub tolerated_lfrc: [Frc; 8],
    pub candidate_threshold: Length,
    pub weights: ScoringWeights,
    pub fow_standin_score: [[f64; 8]; 8],
    pub bear_dist: Length,
    /// Hard pre-filter: candidates whose bearing deviates by more than this
    /// many degrees are rejected before scoring. `None` disables the filter.
    pub max_bear_deviation: Option<f64>,
    /// Selects the `PointOnLine` fraction interpretation; see
    /// [`crate::PointOnLine`].
    pub equal_area: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            search_radius: Length::from_meters(100.0),
            max_dnp_deviation: 0.3,
            tolerated_dnp_dev: Length::from_meters(30.0),
            min_score: 0.3,
            tolerated_lfrc: IDENTITY_TOLERATED_LFRC,
            candidate_threshold: Length::from_meters(20.0),
            weights: ScoringWeights::default(),
            fow_standin_score: crate::scoring::DEFAULT_FOW_STAND_IN_SCORE,
            bear_dist: Length::from_meters(20.0),
            max_bear_deviation: None,
            equal_area: false,
        }
    }
}

fn map_err<E: std::fmt::Display>(error: E) -> DecodeError {
    DecodeError::Map(error.to_string())
}

fn observed<LineId: Copy>(candidates: &[Candidate<LineId>]) -> Vec<ObservedCandidate<LineId>> {
    candidates
        .iter()
        .map(|c| ObservedCandidate {
            point: c.point,
            score: c.score,
        })
        .collect()
}

/// Resolves a [`LocationReference`] against `map`, dispatching on its variant.
pub fn decode<M: Map>(
    reference: &LocationReference,
    map: &M,
    config: &DecoderConfig,
    observer: &mut impl Observer<M::LineId>,
) -> Result<DecodedLocation<M::LineId>, DecodeError> {
    match reference {
        LocationReference::Line(line) => {
            decode_line(line, map, config, observer).map(DecodedLocation::Line)
        }
        LocationReference::GeoCoordinate(coordinate) => {
            Ok(DecodedLocation::Coordinate(*coordinate))
        }
        LocationReference::PointAlongLine(pal) => {
            decode_point_along_line(pal, map, config, observer).map(DecodedLocation::PointAlongLine)
        }
        LocationReference::Poi(poi) => decode_poi(poi, map, config, observer).map(DecodedLocation::Poi),
    }
}

fn validate_line(line: &model::Line) -> Result<(), DecodeError> {
    if line.points.len() < 2 {
        return Err(DecodeError::InvalidReference(format!(
            "a line location needs at least 2 anchors, got {}",
            line.points.len()
        )));
    }
    for (index, point) in line.points.iter().enumerate() {
        let is_last = index == line.points.len() - 1;
        if !is_last && point.path.is_none() {
            return Err(DecodeError::InvalidReference(format!(
                "anchor {index} is not the last anchor but carries no path attributes"
            )));
        }
    }
    if !(0.0..1.0).contains(&line.offsets.pos.fraction())
        || !(0.0..1.0).contains(&line.offsets.neg.fraction())
    {
        return Err(DecodeError::InvalidReference(
            "offsets must be fractions in [0, 1)".to_owned(),
        ));
    }
    Ok(())
}

/// Per-anchor nomination cache, filled lazily as the backtracking search
/// reaches each anchor.
struct Nominations<LineId> {
    candidates: Vec<Option<Vec<Candidate<LineId>>>>,
}

impl<LineId: Copy> Nominations<LineId> {
    fn new(len: usize) -> Self {
        Self {
            candidates: (0..len).map(|_| None).collect(),
        }
    }

    fn get<M: Map<LineId = LineId>>(
        &mut self,
        map: &M,
        points: &[model::Point],
        index: usize,
        config: &DecoderConfig,
        observer: &mut impl Observer<LineId>,
    ) -> Result<&[Candidate<LineId>], DecodeError> {
        if self.candidates[index].is_none() {
            let is_last = index == points.len() - 1;
            let nominated =
                candidates::nominate(map, &points[index], index, is_last, config, observer)
                    .map_err(map_err)?;
            self.candidates[index] = Some(nominated);
        }
        Ok(self.candidates[index].as_ref().unwrap())
    }
}

/// Resolves a line location reference by nominating candidates anchor by
/// anchor and depth-first backtracking whenever a pairwise match, or
/// everything reachable beyond it, fails; see spec.md §4.6.
///
/// The only choice point that matters is "which candidate for this anchor do
/// we commit to": once a `from` point is fixed, [`matcher::match_pair`]
/// deterministically finds the nearest reachable candidate for the next
/// anchor. So backtracking here means excluding a committed candidate that
/// turned out to be a dead end further down the chain, and retrying the
/// pairwise match over what remains.
fn decode_line<M: Map>(
    line: &model::Line,
    map: &M,
    config: &DecoderConfig,
    observer: &mut impl Observer<M::LineId>,
) -> Result<LineLocation<M::LineId>, DecodeError> {
    validate_line(line)?;

    let mut nominations = Nominations::new(line.points.len());
    let start_candidates = nominations
        .get(map, &line.points, 0, config, observer)?
        .to_vec();
    if start_candidates.is_empty() {
        return Err(DecodeError::NoCandidates { anchor_index: 0 });
    }

    let mut last_error = None;
    for start in &start_candidates {
        match resolve_from(0, start.point, line, map, config, observer, &mut nominations) {
            Ok(routes) => {
                let combined = path::combine_routes(&routes);
                let first_length = map.get_line_length(combined.start.line).map_err(map_err)?;
                let last_length = map.get_line_length(combined.end.line).map_err(map_err)?;
                let p_off = line.offsets.pos.resolve(first_length);
                let n_off = line.offsets.neg.resolve(last_length);
                let trimmed = path::remove_offsets(map, combined, p_off, n_off)?;
                return Ok(LineLocation {
                    route: trimmed,
                    p_off,
                    n_off,
                });
            }
            Err(error) => last_error = Some(error),
        }
    }

    Err(last_error.unwrap_or(DecodeError::NoCandidates { anchor_index: 0 }))
}

/// Extends a committed match from `from` (a resolved point sitting on anchor
/// `anchor_index`) through to the last anchor, trying every candidate of the
/// next anchor (in score order) and recursing; a candidate whose continuation
/// ultimately fails is excluded and the next-best one is tried in its place.
fn resolve_from<M: Map>(
    anchor_index: usize,
    from: crate::path::PointOnLine<M::LineId>,
    line: &model::Line,
    map: &M,
    config: &DecoderConfig,
    observer: &mut impl Observer<M::LineId>,
    nominations: &mut Nominations<M::LineId>,
) -> Result<Vec<Route<M::LineId>>, DecodeError> {
    if anchor_index == line.points.len() - 1 {
        return Ok(Vec::new());
    }

    let mut to_candidates = nominations
        .get(map, &line.points, anchor_index + 1, config, observer)?
        .to_vec();
    if to_candidates.is_empty() {
        return Err(DecodeError::NoCandidates {
            anchor_index: anchor_index + 1,
        });
    }
    let all_to_candidates = to_candidates.clone();

    let path_attrs = line.points[anchor_index]
        .path
        .expect("validate_line guarantees non-last anchors carry path attributes");
    let bounds = LengthBounds::from_expected_dnp(
        path_attrs.dnp,
        config.max_dnp_deviation,
        config.tolerated_dnp_dev,
    );
    let lowest_frc = config.tolerated_lfrc[path_attrs.lfrcnp as usize];

    let from_line = from.line;
    let mut last_reason = RouteMatchError::NoRouteFound;

    while !to_candidates.is_empty() {
        match matcher::match_pair(map, from, &to_candidates, bounds, lowest_frc) {
            Ok((route, index)) => {
                let to_line = to_candidates[index].point.line;
                observer.on_route_success(anchor_index, anchor_index + 1, from_line, to_line, &route);
                debug!(anchor_index, next = anchor_index + 1, "pairwise match succeeded");

                match resolve_from(
                    anchor_index + 1,
                    route.end,
                    line,
                    map,
                    config,
                    observer,
                    nominations,
                ) {
                    Ok(mut rest) => {
                        let mut routes = vec![route];
                        routes.append(&mut rest);
                        return Ok(routes);
                    }
                    Err(_) => {
                        warn!(
                            anchor_index,
                            next = anchor_index + 1,
                            "committed candidate led to a dead end further on, backtracking"
                        );
                        to_candidates.remove(index);
                        continue;
                    }
                }
            }
            Err(MatchOutcome::Route(reason)) => {
                observer.on_route_fail(anchor_index, anchor_index + 1, from_line, &reason);
                last_reason = reason;
                break;
            }
            Err(MatchOutcome::Map(error)) => return Err(map_err(error)),
        }
    }

    observer.on_matching_fail(
        anchor_index,
        anchor_index + 1,
        &observed(&[Candidate {
            point: from,
            score: 1.0,
        }]),
        &observed(&all_to_candidates),
        &last_reason,
    );
    Err(DecodeError::NoMatch {
        from_anchor: anchor_index,
        to_anchor: anchor_index + 1,
        reason: last_reason,
    })
}

fn decode_point_along_line<M: Map>(
    pal: &model::PointAlongLine,
    map: &M,
    config: &DecoderConfig,
    observer: &mut impl Observer<M::LineId>,
) -> Result<PointAlongLineLocation<M::LineId>, DecodeError> {
    let line = model::Line {
        points: pal.points.to_vec(),
        offsets: Offsets {
            pos: pal.offset,
            neg: model::Offset::ZERO,
        },
    };
    let resolved = decode_line(&line, map, config, observer)?;
    Ok(PointAlongLineLocation {
        line: resolved.route.start.line,
        fraction: resolved.route.start.fraction,
        orientation: pal.orientation,
        side: pal.side,
    })
}

fn decode_poi<M: Map>(
    poi: &model::Poi,
    map: &M,
    config: &DecoderConfig,
    observer: &mut impl Observer<M::LineId>,
) -> Result<PoiLocation<M::LineId>, DecodeError> {
    let access_point = decode_point_along_line(&poi.point, map, config, observer)?;
    Ok(PoiLocation {
        access_point,
        poi: poi.poi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::FixtureMap;
    use crate::model::{Bearing, Fow, LineAttributes, Offset, Point};
    use crate::observer::{NullObserver, RecordingObserver};

    fn anchor(
        coordinate: crate::model::Coordinate,
        bearing_degrees: f64,
        dnp: Option<(Frc, f64)>,
    ) -> Point {
        Point {
            coordinate,
            line: LineAttributes {
                frc: Frc::Frc2,
                fow: Fow::SingleCarriageway,
                bearing: Bearing::from_degrees(bearing_degrees),
            },
            path: dnp.map(|(lfrcnp, dnp)| model::PathAttributes {
                lfrcnp,
                dnp: Length::from_meters(dnp),
            }),
        }
    }

    #[test]
    fn decodes_the_three_segment_path() {
        let map = FixtureMap::three_segment_path();
        let config = DecoderConfig::default();

        let n1 = map.get_node_coordinate(1).unwrap();
        let n2 = map.get_node_coordinate(2).unwrap();
        let n3 = map.get_node_coordinate(3).unwrap();
        let n4 = map.get_node_coordinate(4).unwrap();

        let dnp_a = crate::geodesy::distance(n1, n2).meters() + crate::geodesy::distance(n2, n3).meters();
        let dnp_b = crate::geodesy::distance(n3, n4).meters();

        let line = model::Line {
            points: vec![
                anchor(n1, 90.0, Some((Frc::Frc2, dnp_a))),
                anchor(n3, 170.0, Some((Frc::Frc2, dnp_b))),
                anchor(n4, 320.0, None),
            ],
            offsets: Offsets::default(),
        };

        let mut observer = NullObserver;
        let decoded = decode_line(&line, &map, &config, &mut observer).unwrap();
        assert_eq!(decoded.route.lines(), vec![1, 3, 4]);
    }

    #[test]
    fn no_route_fails_with_no_match() {
        let map = FixtureMap::disconnected_pair();
        let config = DecoderConfig::default();

        let n1 = map.get_node_coordinate(1).unwrap();
        let n3 = map.get_node_coordinate(3).unwrap();

        let line = model::Line {
            points: vec![
                anchor(n1, 90.0, Some((Frc::Frc2, 300.0))),
                anchor(n3, 270.0, None),
            ],
            offsets: Offsets::default(),
        };

        let mut observer = NullObserver;
        let result = decode_line(&line, &map, &config, &mut observer);
        assert!(matches!(result, Err(DecodeError::NoMatch { .. })));
    }

    #[test]
    fn backtracks_past_a_dead_end_to_the_real_candidate() {
        let map = FixtureMap::backtracking_detour();
        let config = DecoderConfig {
            search_radius: Length::from_meters(10.0),
            max_dnp_deviation: 0.05,
            ..Default::default()
        };

        let n1 = map.get_node_coordinate(1).unwrap();
        let n2 = map.get_node_coordinate(2).unwrap();
        let dnp = crate::geodesy::distance(n1, n2);

        let line = model::Line {
            points: vec![
                anchor(n1, 90.0, Some((Frc::Frc2, dnp.meters()))),
                anchor(n2, 90.0, None),
            ],
            offsets: Offsets::default(),
        };

        let mut observer = RecordingObserver::new();
        let decoded = decode_line(&line, &map, &config, &mut observer).unwrap();
        assert_eq!(decoded.route.lines(), vec![20]);
        assert!(!observer.failed_matches.is_empty());
    }

    #[test]
    fn offsets_too_large_is_rejected() {
        let map = FixtureMap::three_segment_path();
        let config = DecoderConfig::default();

        let n1 = map.get_node_coordinate(1).unwrap();
        let n2 = map.get_node_coordinate(2).unwrap();

        let line = model::Line {
            points: vec![
                anchor(n1, 90.0, Some((Frc::Frc2, crate::geodesy::distance(n1, n2).meters()))),
                anchor(n2, 270.0, None),
            ],
            offsets: Offsets {
                pos: Offset::from_fraction(0.99),
                neg: Offset::from_fraction(0.99),
            },
        };

        let mut observer = NullObserver;
        let result = decode_line(&line, &map, &config, &mut observer);
        assert!(matches!(result, Err(DecodeError::OffsetsTooLarge)));
    }

    #[test]
    fn invalid_reference_rejects_single_anchor() {
        let line = model::Line {
            points: vec![anchor(crate::model::Coordinate::default(), 0.0, None)],
            offsets: Offsets::default(),
        };
        assert!(matches!(
            validate_line(&line),
            Err(DecodeError::InvalidReference(_))
        ));
    }
}
