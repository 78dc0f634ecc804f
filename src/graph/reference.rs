//! A production-quality [`Map`] implementation backed by an `rstar` spatial
//! index, gated behind the `reference-map` feature. Useful for quick
//! integration against an in-memory road network; the decoder core itself
//! only ever depends on the [`Map`] trait.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use geo::{BoundingRect, Closest, Distance, Haversine, HaversineClosestPoint, LineString, coord};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use thiserror::Error;

use crate::geodesy;
use crate::graph::{Map, NearbyLine, Projection};
use crate::model::{Bearing, Coordinate, Fow, Frc, Length};

/// Why a [`ReferenceMap`] accessor failed: the only way it can, an id that
/// was never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReferenceMapError {
    #[error("line not present in the reference map")]
    UnknownLine,
    #[error("node not present in the reference map")]
    UnknownNode,
}

#[derive(Debug, Clone)]
struct LineRecord<NodeId> {
    start: NodeId,
    end: NodeId,
    geometry: Vec<Coordinate>,
    length: Length,
    frc: Frc,
    fow: Fow,
}

struct GeospatialLine<LineId> {
    id: LineId,
    geometry: LineString,
}

impl<LineId> RTreeObject for GeospatialLine<LineId> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let bbox = self
            .geometry
            .bounding_rect()
            .expect("line geometry has at least two points");
        AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y])
    }
}

impl<LineId> PointDistance for GeospatialLine<LineId> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let query = geo::Point::new(point[0], point[1]);
        match self.geometry.haversine_closest_point(&query) {
            Closest::SinglePoint(p) | Closest::Intersection(p) => {
                Haversine.distance(p, query).powi(2)
            }
            Closest::Indeterminate => f64::INFINITY,
        }
    }
}

/// An in-memory road network, indexed for nearest-line queries with
/// `rstar`. Build one with [`ReferenceMap::insert_line`], then decode
/// against it like any other [`Map`].
pub struct ReferenceMap<LineId, NodeId>
where
    LineId: Debug + Copy + Eq + Hash + Ord,
    NodeId: Debug + Copy + Eq + Hash + Ord,
{
    lines: HashMap<LineId, LineRecord<NodeId>>,
    node_coordinates: HashMap<NodeId, Coordinate>,
    exiting: HashMap<NodeId, Vec<(LineId, NodeId)>>,
    entering: HashMap<NodeId, Vec<(LineId, NodeId)>>,
    index: RTree<GeospatialLine<LineId>>,
}

impl<LineId, NodeId> Default for ReferenceMap<LineId, NodeId>
where
    LineId: Debug + Copy + Eq + Hash + Ord,
    NodeId: Debug + Copy + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self {
            lines: HashMap::new(),
            node_coordinates: HashMap::new(),
            exiting: HashMap::new(),
            entering: HashMap::new(),
            index: RTree::new(),
        }
    }
}

impl<LineId, NodeId> ReferenceMap<LineId, NodeId>
where
    LineId: Debug + Copy + Eq + Hash + Ord,
    NodeId: Debug + Copy + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node's coordinate. Every node id that appears as a line
    /// endpoint needs one recorded before [`Map::get_node_coordinate`] is
    /// called for it.
    pub fn insert_node(&mut self, id: NodeId, coordinate: Coordinate) {
        self.node_coordinates.insert(id, coordinate);
    }

    /// Registers a directed line running from `start` to `end` along
    /// `geometry`, which must have at least two points. A bidirectional
    /// road is two calls with swapped endpoints and reversed geometry —
    /// the same convention real OpenLR maps use for two directed lines per
    /// physical road segment.
    pub fn insert_line(
        &mut self,
        id: LineId,
        start: NodeId,
        end: NodeId,
        frc: Frc,
        fow: Fow,
        geometry: Vec<Coordinate>,
    ) {
        debug_assert!(geometry.len() >= 2, "line geometry needs at least two points");
        let length = geodesy::line_string_length(&geometry);
        let line_string = LineString::from(
            geometry
                .iter()
                .map(|c| coord! { x: c.lon, y: c.lat })
                .collect::<Vec<_>>(),
        );
        self.index.insert(GeospatialLine {
            id,
            geometry: line_string,
        });
        self.exiting.entry(start).or_default().push((id, end));
        self.entering.entry(end).or_default().push((id, start));
        self.lines.insert(
            id,
            LineRecord {
                start,
                end,
                geometry,
                length,
                frc,
                fow,
            },
        );
    }

    fn record(&self, line: LineId) -> Result<&LineRecord<NodeId>, ReferenceMapError> {
        self.lines.get(&line).ok_or(ReferenceMapError::UnknownLine)
    }
}

impl<LineId, NodeId> Map for ReferenceMap<LineId, NodeId>
where
    LineId: Debug + Copy + Eq + Hash + Ord,
    NodeId: Debug + Copy + Eq + Hash + Ord,
{
    type Error = ReferenceMapError;
    type NodeId = NodeId;
    type LineId = LineId;

    fn get_lines_close_to(
        &self,
        coordinate: Coordinate,
        radius: Length,
    ) -> Result<Vec<NearbyLine<LineId>>, ReferenceMapError> {
        let query = [coordinate.lon, coordinate.lat];
        let radius_2 = radius.meters() * radius.meters();
        let nearby = self
            .index
            .nearest_neighbor_iter_with_distance_2(&query)
            .take_while(|(_, distance_2)| *distance_2 <= radius_2)
            .map(|(entry, distance_2)| NearbyLine {
                line: entry.id,
                distance: Length::from_meters(distance_2.sqrt()),
            })
            .collect();
        Ok(nearby)
    }

    fn get_line_start_node(&self, line: LineId) -> Result<NodeId, ReferenceMapError> {
        Ok(self.record(line)?.start)
    }

    fn get_line_end_node(&self, line: LineId) -> Result<NodeId, ReferenceMapError> {
        Ok(self.record(line)?.end)
    }

    fn get_line_length(&self, line: LineId) -> Result<Length, ReferenceMapError> {
        Ok(self.record(line)?.length)
    }

    fn get_line_frc(&self, line: LineId) -> Result<Frc, ReferenceMapError> {
        Ok(self.record(line)?.frc)
    }

    fn get_line_fow(&self, line: LineId) -> Result<Fow, ReferenceMapError> {
        Ok(self.record(line)?.fow)
    }

    fn get_line_geometry(&self, line: LineId) -> Result<Vec<Coordinate>, ReferenceMapError> {
        Ok(self.record(line)?.geometry.clone())
    }

    fn project(&self, line: LineId, coordinate: Coordinate) -> Result<Projection, ReferenceMapError> {
        let record = self.record(line)?;
        let query = geo::Point::new(coordinate.lon, coordinate.lat);

        let mut best_distance = Length::MAX;
        let mut best_along = Length::ZERO;
        let mut walked = Length::ZERO;
        for pair in record.geometry.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let segment = LineString::from(vec![
                coord! { x: from.lon, y: from.lat },
                coord! { x: to.lon, y: to.lat },
            ]);
            let closest = match segment.haversine_closest_point(&query) {
                Closest::SinglePoint(p) | Closest::Intersection(p) => p,
                Closest::Indeterminate => continue,
            };
            let distance = Haversine.distance(closest, query);
            let along = walked.meters() + Haversine.distance(geo::Point::new(from.lon, from.lat), closest);
            if distance < best_distance.meters() {
                best_distance = Length::from_meters(distance);
                best_along = Length::from_meters(along);
            }
            walked = walked + geodesy::distance(from, to);
        }

        Ok(Projection {
            distance_along_line: best_along,
            distance_to_point: best_distance,
        })
    }

    fn get_line_bearing(
        &self,
        line: LineId,
        distance_from_start: Length,
        segment_length: Length,
    ) -> Result<Bearing, ReferenceMapError> {
        let record = self.record(line)?;
        let start = distance_from_start.max(Length::ZERO).min(record.length);
        let end = (start + segment_length).max(Length::ZERO).min(record.length);
        let c1 = geodesy::interpolate(&record.geometry, start);
        let c2 = geodesy::interpolate(&record.geometry, end);
        Ok(geodesy::bearing(c1, c2))
    }

    fn lines_from(&self, node: NodeId) -> Result<Vec<(LineId, NodeId)>, ReferenceMapError> {
        Ok(self.exiting.get(&node).cloned().unwrap_or_default())
    }

    fn lines_into(&self, node: NodeId) -> Result<Vec<(LineId, NodeId)>, ReferenceMapError> {
        Ok(self.entering.get(&node).cloned().unwrap_or_default())
    }

    fn get_node_coordinate(&self, node: NodeId) -> Result<Coordinate, ReferenceMapError> {
        self.node_coordinates
            .get(&node)
            .copied()
            .ok_or(ReferenceMapError::UnknownNode)
    }
}
