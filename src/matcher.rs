//! Pairwise route matcher: shortest-path search between a chosen candidate
//! for one anchor and the nominated candidates of the next, under a length
//! budget and a road-class filter.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::candidates::Candidate;
use crate::error::RouteMatchError;
use crate::graph::Map;
use crate::model::{Frc, Length};
use crate::path::{PointOnLine, Route};

/// The `[lower, upper]` length bound a pairwise route must land in, derived
/// from the declared distance-to-next-point and the configured tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthBounds {
    pub lower: Length,
    pub upper: Length,
}

impl LengthBounds {
    pub fn from_expected_dnp(
        expected_dnp: Length,
        max_dnp_deviation: f64,
        tolerated_dnp_dev: Length,
    ) -> Self {
        let lower = (expected_dnp * (1.0 - max_dnp_deviation) - tolerated_dnp_dev).at_least_zero();
        let upper = expected_dnp * (1.0 + max_dnp_deviation) + tolerated_dnp_dev;
        Self { lower, upper }
    }

    pub fn contains(&self, length: Length) -> bool {
        length >= self.lower && length <= self.upper
    }
}

/// Failure of a single [`match_pair`] attempt: either the pairwise match
/// itself found no acceptable route (recoverable — the caller backtracks),
/// or the map's backing store failed to answer a read (not recoverable).
#[derive(Debug)]
pub enum MatchOutcome<E> {
    Route(RouteMatchError),
    Map(E),
}

impl<E> From<RouteMatchError> for MatchOutcome<E> {
    fn from(reason: RouteMatchError) -> Self {
        Self::Route(reason)
    }
}

/// A state in the Dijkstra frontier: the line just entered and the
/// accumulated length to reach its end node.
///
/// The priority queue depends on the implementation of `Ord`; by default
/// `std::collections::BinaryHeap` is a max-heap, so `Ord` is implemented
/// in reverse to turn it into a min-heap, ties broken on the line id for a
/// deterministic winner between equal-length paths.
#[derive(Debug, Clone, Copy)]
struct HeapElement<LineId> {
    distance: Length,
    line: LineId,
}

impl<LineId> HeapElement<LineId> {
    fn distance_key(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.distance.meters())
    }
}

impl<LineId: Ord> PartialEq for HeapElement<LineId> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<LineId: Ord> Eq for HeapElement<LineId> {}

impl<LineId: Ord> Ord for HeapElement<LineId> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance_key()
            .cmp(&self.distance_key())
            .then_with(|| other.line.cmp(&self.line))
    }
}

impl<LineId: Ord> PartialOrd for HeapElement<LineId> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Attempts a pairwise route from `from` (a candidate for the current
/// anchor) to one of `to_candidates` (candidates for the next anchor), in
/// descending score order, returning the first success together with the
/// index of the `to_candidates` entry it matched.
///
/// `lowest_frc` is the loosest (numerically highest) road class interior
/// lines of the route may have.
pub fn match_pair<M: Map>(
    map: &M,
    from: PointOnLine<M::LineId>,
    to_candidates: &[Candidate<M::LineId>],
    bounds: LengthBounds,
    lowest_frc: Frc,
) -> Result<(Route<M::LineId>, usize), MatchOutcome<M::Error>> {
    // Single-segment shortcut: if `from` and some `to` share a line and
    // `from` sits no further along it, the direct in-segment distance is a
    // route without any graph search, and by construction trivially
    // respects the frc filter (no interior lines).
    if let Some((route, index)) = try_same_line_shortcut(map, from, to_candidates, bounds)
        .map_err(MatchOutcome::Map)?
    {
        return Ok((route, index));
    }

    let from_length = map.get_line_length(from.line).map_err(MatchOutcome::Map)?;
    let start_node = map.get_line_end_node(from.line).map_err(MatchOutcome::Map)?;
    let remaining_on_start = (from_length * (1.0 - from.fraction)).at_least_zero();

    if map.lines_from(start_node).map_err(MatchOutcome::Map)?.is_empty() {
        return Err(RouteMatchError::DeadEnd.into());
    }

    // Multi-target Dijkstra: search the graph from `from`'s own line,
    // stopping at the first (in non-decreasing distance order) line
    // belonging to any of `to_candidates`. Distances and predecessors are
    // keyed on the node a line arrives at, bounding memory to the node
    // count rather than every path explored; the frontier's tie-break is
    // on the entering line's id (`HeapElement::cmp`) for a deterministic
    // winner among equal-length paths.
    let mut distances: FxHashMap<M::NodeId, Length> = FxHashMap::default();
    let mut previous: FxHashMap<M::NodeId, (M::LineId, M::NodeId)> = FxHashMap::default();
    distances.insert(start_node, remaining_on_start);

    let mut frontier: BinaryHeap<HeapElement<M::LineId>> = BinaryHeap::new();
    frontier.push(HeapElement {
        distance: remaining_on_start,
        line: from.line,
    });

    let mut best_without_frc_filter: Option<Length> = None;

    while let Some(element) = frontier.pop() {
        let line = element.line;
        let node = map.get_line_end_node(line).map_err(MatchOutcome::Map)?;
        let distance = element.distance;

        let best_known = *distances.get(&node).unwrap_or(&Length::MAX);
        if distance > best_known {
            continue;
        }

        if distance <= bounds.upper {
            best_without_frc_filter = Some(
                best_without_frc_filter.map_or(distance, |best| best.min(distance)),
            );
        } else {
            continue;
        }

        let line_frc = map.get_line_frc(line).map_err(MatchOutcome::Map)?;
        if line_frc > lowest_frc {
            continue;
        }

        if let Some(matched_index) = matches_candidate(line, to_candidates) {
            let to = to_candidates[matched_index].point;
            let line_length = map.get_line_length(line).map_err(MatchOutcome::Map)?;
            let total = distance - line_length + line_length * to.fraction;
            if bounds.contains(total) {
                let arrived_from = map.get_line_start_node(line).map_err(MatchOutcome::Map)?;
                let route = reconstruct(from, &previous, line, arrived_from, to);
                debug!(?total, "pairwise match found");
                return Ok((route, matched_index));
            }
        }

        // no U-turns: never re-cross the edge just arrived on.
        let arrived_from = map.get_line_start_node(line).map_err(MatchOutcome::Map)?;
        for (next_line, next_end) in map.lines_from(node).map_err(MatchOutcome::Map)? {
            if next_end == arrived_from {
                continue;
            }

            let next_length = map.get_line_length(next_line).map_err(MatchOutcome::Map)?;
            let candidate_distance = distance + next_length;
            if candidate_distance > bounds.upper {
                continue;
            }

            let best_known_for_target = *distances.get(&next_end).unwrap_or(&Length::MAX);
            if candidate_distance < best_known_for_target {
                distances.insert(next_end, candidate_distance);
                previous.insert(next_end, (next_line, node));
                frontier.push(HeapElement {
                    distance: candidate_distance,
                    line: next_line,
                });
            }
        }
    }

    trace!("pairwise match exhausted frontier without success");
    if best_without_frc_filter.is_none() {
        Err(RouteMatchError::DnpOutOfRange.into())
    } else {
        Err(RouteMatchError::NoRouteFound.into())
    }
}

fn try_same_line_shortcut<M: Map>(
    map: &M,
    from: PointOnLine<M::LineId>,
    to_candidates: &[Candidate<M::LineId>],
    bounds: LengthBounds,
) -> Result<Option<(Route<M::LineId>, usize)>, M::Error> {
    for (index, candidate) in to_candidates.iter().enumerate() {
        if candidate.point.line != from.line || candidate.point.fraction < from.fraction {
            continue;
        }
        let length = map.get_line_length(from.line)?;
        let direct = (length * (candidate.point.fraction - from.fraction)).at_least_zero();
        if bounds.contains(direct) {
            return Ok(Some((
                Route {
                    start: from,
                    interior: Vec::new(),
                    end: candidate.point,
                },
                index,
            )));
        }
    }
    Ok(None)
}

fn matches_candidate<LineId: Copy + PartialEq>(
    line: LineId,
    to_candidates: &[Candidate<LineId>],
) -> Option<usize> {
    to_candidates.iter().position(|c| c.point.line == line)
}

/// Walks `previous` back from `arrived_from` (the node `final_line` departs
/// from) to the search root, then appends `final_line` at the end.
fn reconstruct<LineId: Copy, NodeId: Eq + std::hash::Hash + Copy>(
    from: PointOnLine<LineId>,
    previous: &FxHashMap<NodeId, (LineId, NodeId)>,
    final_line: LineId,
    arrived_from: NodeId,
    to: PointOnLine<LineId>,
) -> Route<LineId> {
    let mut interior = Vec::new();
    let mut node = arrived_from;
    while let Some(&(line, predecessor)) = previous.get(&node) {
        interior.push(line);
        node = predecessor;
    }
    interior.reverse();
    interior.push(final_line);

    Route {
        start: from,
        interior,
        end: to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::FixtureMap;

    #[test]
    fn same_line_shortcut_avoids_search() {
        let map = FixtureMap::three_segment_path();
        let from = PointOnLine::length_proportional(1, 0.1);
        let to = Candidate {
            point: PointOnLine::length_proportional(1, 0.9),
            score: 1.0,
        };
        let bounds = LengthBounds {
            lower: Length::ZERO,
            upper: Length::MAX,
        };
        let (route, index) = match_pair(&map, from, &[to], bounds, Frc::Frc7).unwrap();
        assert_eq!(index, 0);
        assert!(route.interior.is_empty());
    }

    #[test]
    fn multi_segment_match_follows_the_three_segment_path() {
        let map = FixtureMap::three_segment_path();
        let from = PointOnLine::length_proportional(1, 0.0);
        let to = Candidate {
            point: PointOnLine::length_proportional(4, 1.0),
            score: 1.0,
        };
        let expected = map.get_line_length(1).unwrap()
            + map.get_line_length(3).unwrap()
            + map.get_line_length(4).unwrap();
        let bounds = LengthBounds::from_expected_dnp(expected, 0.3, Length::from_meters(30.0));
        let (route, _) = match_pair(&map, from, &[to], bounds, Frc::Frc7).unwrap();
        assert_eq!(route.lines(), vec![1, 3, 4]);
    }

    #[test]
    fn dead_end_candidate_fails_fast() {
        let map = FixtureMap::dead_end_spur();
        let from = PointOnLine::length_proportional(2, 1.0);
        let to = Candidate {
            point: PointOnLine::length_proportional(1, 1.0),
            score: 1.0,
        };
        let bounds = LengthBounds {
            lower: Length::ZERO,
            upper: Length::MAX,
        };
        let result = match_pair(&map, from, &[to], bounds, Frc::Frc7);
        assert!(matches!(result, Err(MatchOutcome::Route(RouteMatchError::DeadEnd))));
    }
}
