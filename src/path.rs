//! Routes, points-on-line, and the length/coordinate queries over them.
//!
//! These are the immutable value types the rest of the decoder passes
//! around: a [`PointOnLine`] is where a candidate sits on a line, and a
//! [`Route`] is a (possibly multi-line) partial path between two such
//! points.

use crate::error::DecodeError;
use crate::graph::Map;
use crate::model::{Coordinate, Length};

/// A point on a line, given as the fraction of the line's length reached so
/// far.
///
/// Two fraction interpretations exist, selected by `equal_area`:
/// - length-proportional (`equal_area = false`, the default): `fraction` is
///   cumulative arc length divided by the line's total length — meters
///   accurate.
/// - equal-area (`equal_area = true`): `fraction` is in the line's
///   parametric (vertex-index) space, kept only for compatibility with
///   encoders that produced references this way; it can differ from the
///   arc-length fraction for a non-uniformly sampled polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOnLine<LineId> {
    pub line: LineId,
    pub fraction: f64,
    pub equal_area: bool,
}

impl<LineId: Copy> PointOnLine<LineId> {
    pub fn length_proportional(line: LineId, fraction: f64) -> Self {
        Self {
            line,
            fraction: fraction.clamp(0.0, 1.0),
            equal_area: false,
        }
    }

    pub fn from_absolute_offset<M: Map<LineId = LineId>>(
        map: &M,
        line: LineId,
        offset: Length,
    ) -> Result<Self, M::Error> {
        let length = map.get_line_length(line)?;
        let fraction = if length.is_zero() {
            0.0
        } else {
            offset.meters() / length.meters()
        };
        Ok(Self::length_proportional(line, fraction))
    }

    /// Absolute offset in meters from the start of the line.
    pub fn absolute_offset<M: Map<LineId = LineId>>(&self, map: &M) -> Result<Length, M::Error> {
        let length = map.get_line_length(self.line)?;
        Ok(self.resolve_length(length))
    }

    fn resolve_length(&self, line_length: Length) -> Length {
        if self.equal_area {
            // Parametric space only differs from arc length in where along
            // the geometry the fraction lands, not in the length unit
            // itself, so the absolute-offset meters computation is shared.
            line_length * self.fraction
        } else {
            line_length * self.fraction
        }
    }

    /// The concrete coordinate this point resolves to.
    pub fn coordinate<M: Map<LineId = LineId>>(&self, map: &M) -> Result<Coordinate, M::Error> {
        let geometry = map.get_line_geometry(self.line)?;
        if self.equal_area {
            Ok(parametric_interpolate(&geometry, self.fraction))
        } else {
            let length = map.get_line_length(self.line)?;
            Ok(crate::geodesy::interpolate(&geometry, length * self.fraction))
        }
    }
}

/// Interpolates along a polyline treating `fraction` as a position in
/// vertex-index space rather than arc length.
fn parametric_interpolate(polyline: &[Coordinate], fraction: f64) -> Coordinate {
    let Some(&first) = polyline.first() else {
        return Coordinate::default();
    };
    if polyline.len() < 2 {
        return first;
    }

    let position = fraction.clamp(0.0, 1.0) * (polyline.len() - 1) as f64;
    let index = position.floor() as usize;
    let local_fraction = position - index as f64;

    if index + 1 >= polyline.len() {
        return *polyline.last().unwrap();
    }

    let a = polyline[index];
    let b = polyline[index + 1];
    Coordinate {
        lon: a.lon + (b.lon - a.lon) * local_fraction,
        lat: a.lat + (b.lat - a.lat) * local_fraction,
    }
}

/// Vertices of `polyline` strictly beyond `fraction` of its arc length, for
/// splicing after an interpolated start point.
fn after_fraction(polyline: &[Coordinate], fraction: f64) -> Vec<Coordinate> {
    let cut = vertex_cut_index(polyline, fraction);
    polyline[cut..].to_vec()
}

/// Vertices of `polyline` strictly before `fraction` of its arc length, for
/// splicing before an interpolated end point.
fn before_fraction(polyline: &[Coordinate], fraction: f64) -> Vec<Coordinate> {
    let cut = vertex_cut_index(polyline, fraction);
    polyline[..cut].to_vec()
}

/// Index of the first vertex whose cumulative arc length from the start of
/// `polyline` reaches or passes `fraction` of the total length. Vertex 0
/// (cumulative length zero) never qualifies, so a `fraction` of `0.0` keeps
/// every vertex and a `fraction` of `1.0` keeps only the last one.
fn vertex_cut_index(polyline: &[Coordinate], fraction: f64) -> usize {
    if polyline.len() < 2 {
        return polyline.len();
    }
    let total = crate::geodesy::line_string_length(polyline);
    if total.is_zero() {
        return polyline.len();
    }
    let target = total * fraction.clamp(0.0, 1.0);
    let mut walked = Length::ZERO;
    for (index, coordinate) in polyline.iter().enumerate() {
        if index > 0 {
            walked = walked + crate::geodesy::distance(polyline[index - 1], *coordinate);
        }
        if walked >= target && index > 0 {
            return index;
        }
    }
    polyline.len()
}

/// A directed path on the map with partial start/end lines: a concrete
/// resolution of part (or all) of a location reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Route<LineId> {
    pub start: PointOnLine<LineId>,
    pub interior: Vec<LineId>,
    pub end: PointOnLine<LineId>,
}

impl<LineId: Copy + PartialEq> Route<LineId> {
    /// All distinct lines this route touches, in order, without repeating
    /// the boundary line when start and end share it.
    pub fn lines(&self) -> Vec<LineId> {
        if self.interior.is_empty() && self.start.line == self.end.line {
            return vec![self.start.line];
        }

        let mut lines = Vec::with_capacity(self.interior.len() + 2);
        lines.push(self.start.line);
        lines.extend(self.interior.iter().copied());
        lines.push(self.end.line);
        lines
    }

    pub fn length<M: Map<LineId = LineId>>(&self, map: &M) -> Result<Length, M::Error> {
        if self.interior.is_empty() && self.start.line == self.end.line {
            let length = map.get_line_length(self.start.line)?;
            return Ok((length * (self.end.fraction - self.start.fraction)).at_least_zero());
        }

        let start_length = map.get_line_length(self.start.line)?;
        let end_length = map.get_line_length(self.end.line)?;
        let interior_length: Length = self
            .interior
            .iter()
            .map(|&line| map.get_line_length(line))
            .sum::<Result<Length, _>>()?;

        Ok(start_length * (1.0 - self.start.fraction) + interior_length + end_length * self.end.fraction)
    }

    pub fn absolute_start_offset<M: Map<LineId = LineId>>(
        &self,
        map: &M,
    ) -> Result<Length, M::Error> {
        self.start.absolute_offset(map)
    }

    /// Offset in meters from the *end* of the last line back to where the
    /// route actually ends.
    pub fn absolute_end_offset<M: Map<LineId = LineId>>(
        &self,
        map: &M,
    ) -> Result<Length, M::Error> {
        let end_length = map.get_line_length(self.end.line)?;
        Ok(end_length * (1.0 - self.end.fraction))
    }

    /// The exact polyline this route covers, with no two consecutive
    /// identical coordinates: the first line's geometry is clipped to begin
    /// at `start`'s position and the last line's geometry is clipped to end
    /// at `end`'s position, mirroring the declared start/end fractions
    /// rather than each line's raw, untrimmed vertex list.
    pub fn coordinates<M: Map<LineId = LineId>>(
        &self,
        map: &M,
    ) -> Result<Vec<Coordinate>, M::Error> {
        let lines = self.lines();
        let last_index = lines.len() - 1;

        let mut coordinates = Vec::new();
        for (index, &line) in lines.iter().enumerate() {
            let geometry = map.get_line_geometry(line)?;

            let geometry = match (index == 0, index == last_index) {
                (true, true) => vec![self.start.coordinate(map)?, self.end.coordinate(map)?],
                (true, false) => {
                    let start = self.start.coordinate(map)?;
                    let mut clipped = vec![start];
                    clipped.extend(after_fraction(&geometry, self.start.fraction));
                    clipped
                }
                (false, true) => {
                    let mut clipped = before_fraction(&geometry, self.end.fraction);
                    clipped.push(self.end.coordinate(map)?);
                    clipped
                }
                (false, false) => geometry,
            };

            for coordinate in geometry {
                if coordinates.last() != Some(&coordinate) {
                    coordinates.push(coordinate);
                }
            }
        }
        Ok(coordinates)
    }
}

/// Concatenates the per-pair partial routes of a full location reference
/// into a single combined route, deduplicating a shared boundary line when
/// the last line of one route equals the first line of the next.
pub fn combine_routes<LineId: Copy + PartialEq>(routes: &[Route<LineId>]) -> Route<LineId> {
    assert!(!routes.is_empty(), "combine_routes requires at least one route");

    let mut lines: Vec<LineId> = Vec::new();
    for route in routes {
        for line in route.lines() {
            if lines.last() == Some(&line) {
                lines.pop();
            }
            lines.push(line);
        }
    }

    let start_fraction = routes[0].start.fraction;
    let start_equal_area = routes[0].start.equal_area;
    let end_fraction = routes[routes.len() - 1].end.fraction;
    let end_equal_area = routes[routes.len() - 1].end.equal_area;

    let start_line = lines.remove(0);
    let end_line = if lines.is_empty() {
        start_line
    } else {
        lines.pop().unwrap()
    };

    Route {
        start: PointOnLine {
            line: start_line,
            fraction: start_fraction,
            equal_area: start_equal_area,
        },
        interior: lines,
        end: PointOnLine {
            line: end_line,
            fraction: end_fraction,
            equal_area: end_equal_area,
        },
    }
}

/// Trims `p_off`/`n_off` meters of head/tail offset from `route`, dropping
/// whole lines that are entirely consumed by the offset and adjusting the
/// boundary fractions of what remains.
pub fn remove_offsets<M: Map>(
    map: &M,
    route: Route<M::LineId>,
    p_off: Length,
    n_off: Length,
) -> Result<Route<M::LineId>, DecodeError>
where
    M::Error: std::fmt::Display,
{
    let mut lines = route.lines();

    let mut remaining_p_off = p_off + route.absolute_start_offset(map).map_err(map_err)?;
    while !lines.is_empty()
        && remaining_p_off >= map.get_line_length(lines[0]).map_err(map_err)?
    {
        let length = map.get_line_length(lines.remove(0)).map_err(map_err)?;
        remaining_p_off = remaining_p_off - length;
        if lines.is_empty() {
            return Err(DecodeError::OffsetsTooLarge);
        }
    }

    let mut remaining_n_off = n_off + route.absolute_end_offset(map).map_err(map_err)?;
    while !lines.is_empty()
        && remaining_n_off >= map.get_line_length(*lines.last().unwrap()).map_err(map_err)?
    {
        let length = map.get_line_length(lines.pop().unwrap()).map_err(map_err)?;
        remaining_n_off = remaining_n_off - length;
        if lines.is_empty() {
            return Err(DecodeError::OffsetsTooLarge);
        }
    }

    let start_line = lines.remove(0);
    let end_line = if lines.is_empty() {
        start_line
    } else {
        lines.pop().unwrap()
    };
    let end_length = map.get_line_length(end_line).map_err(map_err)?;

    Ok(Route {
        start: PointOnLine::from_absolute_offset(map, start_line, remaining_p_off)
            .map_err(map_err)?,
        interior: lines,
        end: PointOnLine::from_absolute_offset(
            map,
            end_line,
            (end_length - remaining_n_off).at_least_zero(),
        )
        .map_err(map_err)?,
    })
}

fn map_err<E: std::fmt::Display>(error: E) -> DecodeError {
    DecodeError::Map(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::FixtureMap;

    #[test]
    fn single_segment_route_length() {
        let map = FixtureMap::three_segment_path();
        let route = Route {
            start: PointOnLine::length_proportional(1, 0.25),
            interior: vec![],
            end: PointOnLine::length_proportional(1, 0.75),
        };

        let length = route.length(&map).unwrap();
        let line_length = map.get_line_length(1).unwrap();
        assert!((length.meters() - line_length.meters() * 0.5).abs() < 1e-6);
    }

    #[test]
    fn absolute_end_offset_is_measured_from_the_end_of_the_last_line() {
        let map = FixtureMap::three_segment_path();
        let route = Route {
            start: PointOnLine::length_proportional(1, 0.0),
            interior: vec![3],
            end: PointOnLine::length_proportional(4, 1.0),
        };
        // `end.fraction == 1.0` means the route runs all the way to the end
        // of line 4, so there is no offset left to trim off the tail.
        assert!(route.absolute_end_offset(&map).unwrap().is_zero());

        let half = Route {
            end: PointOnLine::length_proportional(4, 0.5),
            ..route
        };
        let line4_length = map.get_line_length(4).unwrap();
        let offset = half.absolute_end_offset(&map).unwrap();
        assert!((offset.meters() - line4_length.meters() * 0.5).abs() < 1e-6);
    }

    #[test]
    fn coordinates_clips_to_the_interpolated_start_and_end_points() {
        let map = FixtureMap::three_segment_path();
        let route = Route {
            start: PointOnLine::length_proportional(1, 0.25),
            interior: vec![3],
            end: PointOnLine::length_proportional(4, 0.5),
        };

        let coordinates = route.coordinates(&map).unwrap();
        let n1 = map.get_node_coordinate(1).unwrap();
        let n2 = map.get_node_coordinate(2).unwrap();
        let n3 = map.get_node_coordinate(3).unwrap();
        let n4 = map.get_node_coordinate(4).unwrap();

        // the first coordinate is 25% along line 1, strictly between its
        // endpoints, not the raw start node.
        let first = coordinates[0];
        assert_ne!(first, n1);
        assert!(first.lon > n1.lon && first.lon < n2.lon);

        // interior nodes survive untouched.
        assert_eq!(coordinates[1], n2);
        assert_eq!(coordinates[2], n3);

        // the last coordinate is halfway along line 4, not its end node.
        let last = *coordinates.last().unwrap();
        assert_ne!(last, n4);
        assert!(last.lon > n3.lon && last.lon < n4.lon);
    }

    #[test]
    fn combine_routes_dedupes_shared_boundary_line() {
        let first = Route {
            start: PointOnLine::length_proportional(1, 0.0),
            interior: vec![],
            end: PointOnLine::length_proportional(3, 1.0),
        };
        let second = Route {
            start: PointOnLine::length_proportional(3, 0.0),
            interior: vec![],
            end: PointOnLine::length_proportional(4, 1.0),
        };

        let combined = combine_routes(&[first, second]);
        assert_eq!(combined.lines(), vec![1, 3, 4]);
    }
}
