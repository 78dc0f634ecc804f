//! Data model for OpenLR location references, decoded from the physical
//! format elsewhere (the binary/text codec is not part of this crate).

use approx::abs_diff_eq;
use strum::{EnumCount, EnumIter};

/// Functional Road Class.
///
/// The functional road class (FRC) of a line is a road classification based
/// on the importance of the road represented by the line. Lower values are
/// more important; `Frc0 <= Frc7` is a meaningful "at least as important as"
/// comparison and is exactly what the pairwise matcher's FRC filter relies
/// on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum Frc {
    /// Main road, highest importance.
    Frc0 = 0,
    Frc1 = 1,
    Frc2 = 2,
    Frc3 = 3,
    Frc4 = 4,
    Frc5 = 5,
    Frc6 = 6,
    /// Other class road, lowest importance.
    Frc7 = 7,
}

impl Default for Frc {
    fn default() -> Self {
        Self::Frc7
    }
}

impl Frc {
    /// Ordinal distance between two classes, in `0..=7`.
    pub const fn ordinal_distance(self, other: Self) -> u8 {
        (self as i8 - other as i8).unsigned_abs()
    }
}

/// Form of Way.
///
/// The form of way (FOW) describes the physical road type of a line. Unlike
/// [`Frc`] this is not an ordered scale — comparisons go through the
/// [`score_fow`](crate::scoring::score_fow) similarity matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum Fow {
    /// The physical road type is unknown.
    Undefined = 0,
    /// Motorway: two or more physically separated carriageways, no
    /// single-level crossings, restricted to motorized vehicles.
    Motorway = 1,
    /// A road with physically separated carriageways that is not a motorway.
    MultipleCarriageway = 2,
    /// All roads without separate carriageways.
    SingleCarriageway = 3,
    /// A ring on which traffic travels in one direction only.
    Roundabout = 4,
    /// An open area (partly) enclosed by roads, not a roundabout.
    TrafficSquare = 5,
    /// A road especially designed to enter or leave another line.
    SlipRoad = 6,
    /// Known but does not fit any other category.
    Other = 7,
}

impl Default for Fow {
    fn default() -> Self {
        Self::Other
    }
}

/// The side of road information (SOR): the relationship between a point of
/// interest and a referenced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SideOfRoad {
    #[default]
    OnRoadOrUnknown,
    Right,
    Left,
    Both,
}

/// The orientation information (ORI): the relationship between a point of
/// interest and the direction of a referenced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Unknown,
    Forward,
    Backward,
    Both,
}

/// A length in meters. Always non-negative for values that come out of the
/// map or the geodesy utilities; arithmetic on it is not itself clamped,
/// callers that can produce a meaningless negative (e.g. "length remaining
/// after subtracting an offset") clamp with [`Length::at_least_zero`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Length(f64);

impl Length {
    pub const ZERO: Self = Self(0.0);
    pub const MAX: Self = Self(f64::MAX);

    pub const fn from_meters(meters: f64) -> Self {
        Self(meters)
    }

    pub const fn meters(self) -> f64 {
        self.0
    }

    pub fn at_least_zero(self) -> Self {
        Self(self.0.max(0.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }

    /// Negated length, used where a distance is measured walking backward
    /// along a line (e.g. the bearing sample for the last anchor of a
    /// location reference).
    pub const fn reverse(self) -> Self {
        Self(-self.0)
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl std::ops::Add for Length {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Length {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::Mul<f64> for Length {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl std::iter::Sum for Length {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, std::ops::Add::add)
    }
}

/// The bearing describes the angle between true North and a road, in
/// degrees, normalized to `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Bearing(f64);

impl Bearing {
    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees.rem_euclid(360.0))
    }

    pub const fn degrees(self) -> f64 {
        self.0
    }

    /// The smaller of the two arcs between two bearings, in `[0, 180]`
    /// degrees.
    pub fn circular_difference(self, other: Self) -> f64 {
        let diff = (self.0 - other.0).abs() % 360.0;
        diff.min(360.0 - diff)
    }
}

/// A WGS-84 coordinate pair: decimal-degree longitude and latitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        const EPSILON: f64 = 1e-5;
        abs_diff_eq!(self.lon, other.lon, epsilon = EPSILON)
            && abs_diff_eq!(self.lat, other.lat, epsilon = EPSILON)
    }
}

/// Line attributes carried by every anchor: functional road class, form of
/// way and bearing (FRC, FOW, BEAR in the OpenLR physical format).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineAttributes {
    pub frc: Frc,
    pub fow: Fow,
    pub bearing: Bearing,
}

/// Path attributes carried by every anchor except the last one: lowest FRC
/// to next point (LFRCNP) and distance to next point (DNP).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathAttributes {
    pub lfrcnp: Frc,
    pub dnp: Length,
}

/// A Location Reference Point (LRP), called an anchor in spec prose.
///
/// `path` is `None` exactly for the last anchor of a location reference —
/// that is the authoritative way to ask [`Point::is_last`], rather than
/// tracking a redundant index alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub coordinate: Coordinate,
    pub line: LineAttributes,
    pub path: Option<PathAttributes>,
}

impl Point {
    pub const fn is_last(&self) -> bool {
        self.path.is_none()
    }
}

/// A head or tail offset, expressed as the `[0, 1)` fraction of a line's
/// length that the OpenLR physical format encodes it as.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset(f64);

impl Offset {
    pub const ZERO: Self = Self(0.0);

    pub const fn from_fraction(fraction: f64) -> Self {
        Self(fraction)
    }

    pub const fn fraction(self) -> f64 {
        self.0
    }

    /// Resolves this fraction against a concrete line length, in meters.
    pub fn resolve(self, line_length: Length) -> Length {
        line_length * self.0
    }
}

/// Positive offset (from the start of the first line) and negative offset
/// (from the end of the last line) of a line location reference.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    pub pos: Offset,
    pub neg: Offset,
}

/// A line location reference: an ordered sequence of at least two anchors
/// plus the head/tail offsets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub points: Vec<Point>,
    pub offsets: Offsets,
}

/// Point along line: a line referenced by its two bounding anchors plus a
/// positive offset locating the exact point, with orientation and
/// side-of-road metadata.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointAlongLine {
    pub points: [Point; 2],
    pub offset: Offset,
    pub orientation: Orientation,
    pub side: SideOfRoad,
}

/// Point of interest with access point: a [`PointAlongLine`] (the access
/// point) plus the free-standing coordinate of the POI itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Poi {
    pub point: PointAlongLine,
    pub poi: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationType {
    Line,
    GeoCoordinate,
    PointAlongLine,
    PoiWithAccessPoint,
}

/// A location reference as received from the (out of scope) physical
/// decoder, ready to be resolved against a target map.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationReference {
    Line(Line),
    GeoCoordinate(Coordinate),
    PointAlongLine(PointAlongLine),
    Poi(Poi),
}

impl LocationReference {
    pub const fn location_type(&self) -> LocationType {
        match self {
            Self::Line(_) => LocationType::Line,
            Self::GeoCoordinate(_) => LocationType::GeoCoordinate,
            Self::PointAlongLine(_) => LocationType::PointAlongLine,
            Self::Poi(_) => LocationType::PoiWithAccessPoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frc_ordinal_distance_is_symmetric_and_bounded() {
        assert_eq!(Frc::Frc0.ordinal_distance(Frc::Frc7), 7);
        assert_eq!(Frc::Frc7.ordinal_distance(Frc::Frc0), 7);
        assert_eq!(Frc::Frc3.ordinal_distance(Frc::Frc3), 0);
    }

    #[test]
    fn bearing_wraps_into_0_360() {
        assert_eq!(Bearing::from_degrees(370.0).degrees(), 10.0);
        assert_eq!(Bearing::from_degrees(-10.0).degrees(), 350.0);
    }

    #[test]
    fn bearing_circular_difference() {
        let a = Bearing::from_degrees(10.0);
        assert_eq!(a.circular_difference(Bearing::from_degrees(10.0)), 0.0);
        assert_eq!(a.circular_difference(Bearing::from_degrees(190.0)), 180.0);
        assert_eq!(a.circular_difference(Bearing::from_degrees(370.0)), 0.0);
    }

    #[test]
    fn point_is_last_tracks_path_attributes() {
        let last = Point::default();
        assert!(last.is_last());

        let not_last = Point {
            path: Some(PathAttributes::default()),
            ..Default::default()
        };
        assert!(!not_last.is_last());
    }
}
