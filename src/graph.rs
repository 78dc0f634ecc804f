//! The map interface: the abstract contract the decoder core consumes to
//! read lines (segments) and nodes from a target road network.
//!
//! The decoder never mutates the map and never assumes anything about how
//! it stores data — a real implementation might hit a spatial index, a
//! database, or an in-memory graph. Accessors are fallible so a backing
//! store that performs blocking I/O can surface its own errors instead of
//! panicking.

use std::error::Error;
use std::fmt::Debug;
use std::hash::Hash;

use crate::model::{Bearing, Coordinate, Fow, Frc};
use crate::Length;

/// The nearest point on a line to some coordinate, and how far along the
/// line (from its start node, by arc length) that point lies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Cumulative arc length from the line's start to the projected point.
    pub distance_along_line: Length,
    /// Straight-line (great-circle) distance from the query coordinate to
    /// the projected point.
    pub distance_to_point: Length,
}

/// A line (segment) discovered near a coordinate, with its distance to that
/// coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyLine<LineId> {
    pub line: LineId,
    pub distance: Length,
}

/// Map interface consumed by the decoder core.
///
/// Implementors must never return a line of zero length from any accessor
/// — the decoder relies on `length > 0` to divide by it; see
/// [`Map::get_line_length`].
pub trait Map {
    /// Custom error type, surfaced when the backing store itself fails
    /// (e.g. a database read error). Not to be confused with the decoder's
    /// own recoverable rejections, which never reach this type.
    type Error: Error;
    /// Uniquely identifies a node in the graph.
    type NodeId: Debug + Copy + Eq + Hash + Ord;
    /// Uniquely identifies a directed line in the graph.
    type LineId: Debug + Copy + Eq + Hash + Ord;

    /// Every line whose geometry lies within `radius` of `coordinate`. No
    /// ordering is required; the decoder tolerates (and filters) false
    /// positives over-returned by a coarse spatial index.
    fn get_lines_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> Result<Vec<NearbyLine<Self::LineId>>, Self::Error>;

    fn get_line_start_node(&self, line: Self::LineId) -> Result<Self::NodeId, Self::Error>;
    fn get_line_end_node(&self, line: Self::LineId) -> Result<Self::NodeId, Self::Error>;
    fn get_line_length(&self, line: Self::LineId) -> Result<Length, Self::Error>;
    fn get_line_frc(&self, line: Self::LineId) -> Result<Frc, Self::Error>;
    fn get_line_fow(&self, line: Self::LineId) -> Result<Fow, Self::Error>;

    /// The line's geometry as an ordered polyline, start to end.
    fn get_line_geometry(&self, line: Self::LineId) -> Result<Vec<Coordinate>, Self::Error>;

    /// Closest point on the line to `coordinate`: its distance along the
    /// line from the start node, and the straight-line distance to it.
    fn project(
        &self,
        line: Self::LineId,
        coordinate: Coordinate,
    ) -> Result<Projection, Self::Error>;

    /// The bearing of the subsection of `line` that starts `distance_from_start`
    /// meters into it and extends `segment_length` meters further (negative
    /// `segment_length` measures backward, used to sample the bearing
    /// approaching a line's end rather than leaving its start).
    fn get_line_bearing(
        &self,
        line: Self::LineId,
        distance_from_start: Length,
        segment_length: Length,
    ) -> Result<Bearing, Self::Error>;

    /// Lines leaving `node`, paired with the node each one enters.
    fn lines_from(
        &self,
        node: Self::NodeId,
    ) -> Result<Vec<(Self::LineId, Self::NodeId)>, Self::Error>;

    /// Lines entering `node`, paired with the node each one leaves from.
    fn lines_into(
        &self,
        node: Self::NodeId,
    ) -> Result<Vec<(Self::LineId, Self::NodeId)>, Self::Error>;

    fn get_node_coordinate(&self, node: Self::NodeId) -> Result<Coordinate, Self::Error>;
}

#[cfg(feature = "reference-map")]
pub mod reference;
