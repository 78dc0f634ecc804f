//! The decoded result types returned by [`crate::decode`].

use crate::graph::Map;
use crate::model::{Coordinate, Length, Orientation, SideOfRoad};
use crate::path::Route;

/// A resolved line location: the route on the target map plus the head/tail
/// offsets trimmed into it.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLocation<LineId> {
    pub route: Route<LineId>,
    pub p_off: Length,
    pub n_off: Length,
}

impl<LineId: Copy + PartialEq> LineLocation<LineId> {
    /// The ordered sequence of lines the location covers.
    pub fn segments(&self) -> Vec<LineId> {
        self.route.lines()
    }

    /// The exact polyline the location covers, with no two consecutive
    /// identical coordinates.
    pub fn coordinates<M: Map<LineId = LineId>>(
        &self,
        map: &M,
    ) -> Result<Vec<Coordinate>, M::Error> {
        self.route.coordinates(map)
    }
}

/// A resolved point along a line, with its side-of-road and orientation
/// metadata carried over from the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAlongLineLocation<LineId> {
    pub line: LineId,
    pub fraction: f64,
    pub orientation: Orientation,
    pub side: SideOfRoad,
}

impl<LineId: Copy> PointAlongLineLocation<LineId> {
    pub fn coordinate<M: Map<LineId = LineId>>(&self, map: &M) -> Result<Coordinate, M::Error> {
        let point = crate::path::PointOnLine::length_proportional(self.line, self.fraction);
        point.coordinate(map)
    }
}

/// A resolved point of interest: its access point on the road network plus
/// its own free-standing coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiLocation<LineId> {
    pub access_point: PointAlongLineLocation<LineId>,
    pub poi: Coordinate,
}

/// The result of a successful decode, one variant per
/// [`crate::LocationType`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLocation<LineId> {
    Line(LineLocation<LineId>),
    PointAlongLine(PointAlongLineLocation<LineId>),
    Poi(PoiLocation<LineId>),
    Coordinate(Coordinate),
}
