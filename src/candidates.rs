//! Candidate nomination: given an anchor, produce a ranked list of
//! candidate points-on-line from the target map.

use tracing::{debug, trace};

use crate::decoder::DecoderConfig;
use crate::graph::Map;
use crate::model::Point;
use crate::observer::{Observer, ObservedCandidate};
use crate::path::PointOnLine;
use crate::scoring::{combine, score_angle_difference, score_frc, score_fow, score_geo};

/// A candidate line nominated for an anchor: where it sits, and how well it
/// scores against that anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<LineId> {
    pub point: PointOnLine<LineId>,
    pub score: f64,
}

/// Nominates and scores every candidate line for `anchor`, in descending
/// score order.
///
/// `is_last` selects which direction the bearing sample walks: forward from
/// the candidate point for every anchor but the last, backward approaching
/// it for the last one (there is no "next point" to walk towards).
pub fn nominate<M: Map>(
    map: &M,
    anchor: &Point,
    anchor_index: usize,
    is_last: bool,
    config: &DecoderConfig,
    observer: &mut impl Observer<M::LineId>,
) -> Result<Vec<Candidate<M::LineId>>, M::Error> {
    let nearby = map.get_lines_close_to(anchor.coordinate, config.search_radius)?;
    trace!(anchor_index, found = nearby.len(), "queried nearby lines");

    let mut candidates = Vec::new();
    for near in nearby {
        let length = map.get_line_length(near.line)?;
        if length.is_zero() {
            continue;
        }

        let projection = map.project(near.line, anchor.coordinate)?;
        if projection.distance_to_point > config.search_radius {
            continue;
        }

        // Snap to whichever node the projection is nearer to, as long as
        // that node is within `candidate_threshold`, rather than keeping a
        // noisy fractional position close to it; a projection near the
        // segment's end snaps to 1.0, not 0.0, so a candidate that is the
        // last line of a route still asks the matcher to consume it in
        // full. Checking "nearer" rather than "either within threshold"
        // matters for lines shorter than twice the threshold, where both
        // ends would otherwise qualify.
        let distance_from_start = projection.distance_along_line.meters();
        let distance_from_end = (length.meters() - distance_from_start).max(0.0);
        let threshold = config.candidate_threshold.meters();
        let fraction = if distance_from_start <= distance_from_end {
            if distance_from_start <= threshold {
                0.0
            } else {
                distance_from_start / length.meters()
            }
        } else if distance_from_end <= threshold {
            1.0
        } else {
            distance_from_start / length.meters()
        };
        let point = PointOnLine::length_proportional(near.line, fraction);

        let bearing_segment_length = if is_last {
            config.bear_dist.reverse()
        } else {
            config.bear_dist
        };
        let candidate_bearing = map.get_line_bearing(
            near.line,
            length * fraction,
            bearing_segment_length,
        )?;

        if let Some(max_deviation) = config.max_bear_deviation {
            if anchor.line.bearing.circular_difference(candidate_bearing) > max_deviation {
                observer.on_candidate_rejected(
                    anchor_index,
                    ObservedCandidate { point, score: 0.0 },
                    "bearing deviation exceeds max_bear_deviation",
                );
                continue;
            }
        }

        let candidate_frc = map.get_line_frc(near.line)?;
        let candidate_fow = map.get_line_fow(near.line)?;

        let score = combine(
            config.weights,
            score_geo(projection.distance_to_point, config.search_radius),
            score_angle_difference(anchor.line.bearing, candidate_bearing),
            score_frc(anchor.line.frc, candidate_frc),
            score_fow(&config.fow_standin_score, anchor.line.fow, candidate_fow),
        );

        if score < config.min_score {
            observer.on_candidate_rejected(
                anchor_index,
                ObservedCandidate { point, score },
                "score below min_score",
            );
            continue;
        }

        observer.on_candidate_found(anchor_index, ObservedCandidate { point, score });
        candidates.push(Candidate { point, score });
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    debug!(anchor_index, surviving = candidates.len(), "nominated candidates");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::FixtureMap;
    use crate::model::LineAttributes;
    use crate::observer::NullObserver;
    use crate::model::{Bearing, Frc, Fow};

    #[test]
    fn nominates_the_line_the_anchor_sits_on() {
        let map = FixtureMap::three_segment_path();
        let anchor = Point {
            coordinate: map.get_node_coordinate(map.get_line_start_node(1).unwrap()).unwrap(),
            line: LineAttributes {
                frc: Frc::Frc0,
                fow: Fow::SingleCarriageway,
                bearing: Bearing::from_degrees(90.0),
            },
            path: None,
        };
        let config = DecoderConfig::default();
        let mut observer = NullObserver;
        let candidates = nominate(&map, &anchor, 0, false, &config, &mut observer).unwrap();
        assert!(candidates.iter().any(|c| c.point.line == 1));
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn rejects_every_candidate_below_min_score() {
        let map = FixtureMap::three_segment_path();
        let anchor = Point {
            coordinate: map.get_node_coordinate(map.get_line_start_node(1).unwrap()).unwrap(),
            line: LineAttributes {
                frc: Frc::Frc7,
                fow: Fow::Motorway,
                bearing: Bearing::from_degrees(270.0),
            },
            path: None,
        };
        let config = DecoderConfig {
            min_score: 1.01,
            ..Default::default()
        };
        let mut observer = NullObserver;
        let candidates = nominate(&map, &anchor, 0, false, &config, &mut observer).unwrap();
        assert!(candidates.is_empty());
    }
}
