#![doc = include_str!("../README.md")]

mod candidates;
mod decoder;
mod error;
mod geodesy;
mod graph;
mod location;
mod matcher;
mod model;
mod observer;
mod path;
mod scoring;

pub use candidates::{Candidate, nominate};
pub use decoder::{DecoderConfig, IDENTITY_TOLERATED_LFRC, decode};
pub use error::{DecodeError, RouteMatchError};
pub use graph::{Map, NearbyLine, Projection};
#[cfg(feature = "reference-map")]
pub use graph::reference::{ReferenceMap, ReferenceMapError};
pub use location::{DecodedLocation, LineLocation, PoiLocation, PointAlongLineLocation};
pub use matcher::{LengthBounds, MatchOutcome, match_pair};
pub use model::{
    Bearing, Coordinate, Fow, Frc, Length, Line, LineAttributes, LocationReference, LocationType,
    Offset, Offsets, Orientation, PathAttributes, Point, Poi, PointAlongLine, SideOfRoad,
};
pub use observer::{
    AttemptedMatch, AttemptedRoute, NullObserver, Observer, ObservedCandidate, RecordingObserver,
};
pub use path::{PointOnLine, Route, combine_routes, remove_offsets};
pub use scoring::{
    DEFAULT_FOW_STAND_IN_SCORE, ScoringWeights, combine, score_angle_difference, score_frc,
    score_fow, score_geo,
};
