use thiserror::Error;

/// Why a single pairwise route attempt between two candidate lines failed.
/// Reported to the [`Observer`](crate::Observer) on every attempt, and
/// surfaced to the caller (wrapped in [`DecodeError::NoMatch`]) only once
/// backtracking has exhausted every candidate combination.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RouteMatchError {
    /// No path between the two candidates satisfies the length bounds and
    /// the FRC filter together.
    #[error("no route found between candidates within the length and FRC bounds")]
    NoRouteFound,
    /// No path satisfies the length bounds even ignoring the FRC filter —
    /// the declared distance-to-next-point itself cannot be matched.
    #[error("distance to next point cannot be matched by any path")]
    DnpOutOfRange,
    /// The start candidate's line has no outgoing line to continue from.
    #[error("candidate line is a dead end")]
    DeadEnd,
}

/// Errors that can terminate a decode.
///
/// Every other rejection (a candidate scoring too low, a single pairwise
/// match failing) is recoverable by backtracking and is only ever reported
/// to the [`Observer`](crate::Observer) — these are the three conditions
/// spec-wise that a decode cannot recover from.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum DecodeError {
    /// The location reference is malformed (e.g. a line with fewer than two
    /// anchors) or of an unsupported variant.
    #[error("invalid location reference: {0}")]
    InvalidReference(String),
    /// Nomination found no surviving candidate for this anchor at all.
    #[error("no candidates found for anchor {anchor_index}")]
    NoCandidates { anchor_index: usize },
    /// Backtracking exhausted every candidate combination between two
    /// anchors.
    #[error(
        "no matching candidate pair between anchor {from_anchor} and {to_anchor}: {reason}"
    )]
    NoMatch {
        from_anchor: usize,
        to_anchor: usize,
        reason: RouteMatchError,
    },
    /// The final offset trim removed more than the combined route length.
    #[error("offsets exceed the combined route length")]
    OffsetsTooLarge,
    /// The map backing store itself failed to answer a read (e.g. a
    /// database error). Not one of the core decode outcomes the spec
    /// enumerates, but a map can fail for reasons the decoder cannot
    /// recover from by backtracking.
    #[error("map read failed: {0}")]
    Map(String),
}
