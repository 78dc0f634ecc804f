//! Optional sink for decode progress events.
//!
//! All callbacks are fire-and-forget and take `&mut self`: the observer must
//! not influence control flow, and since its methods return `()` there is
//! nothing for the decoder to catch if one panics in user code — a Rust
//! `Observer` simply has no channel through which to fail.

use crate::error::RouteMatchError;
use crate::path::{PointOnLine, Route};

/// A candidate nominated for some anchor during scoring, as reported to an
/// [`Observer`]. Carries just enough to identify and rank it; the decoder
/// itself works with the richer internal candidate type in
/// [`crate::candidates`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedCandidate<LineId> {
    pub point: PointOnLine<LineId>,
    pub score: f64,
}

/// Sink for decode progress events. Every method defaults to a no-op, so an
/// implementor only needs to override the callbacks it cares about.
pub trait Observer<LineId> {
    fn on_candidate_found(&mut self, _anchor_index: usize, _candidate: ObservedCandidate<LineId>) {}

    fn on_candidate_rejected(
        &mut self,
        _anchor_index: usize,
        _candidate: ObservedCandidate<LineId>,
        _reason: &str,
    ) {
    }

    fn on_route_success(
        &mut self,
        _from_anchor: usize,
        _to_anchor: usize,
        _from: LineId,
        _to: LineId,
        _route: &Route<LineId>,
    ) {
    }

    /// Fired once a candidate's attempt against the *entire* candidate set
    /// of the next anchor fails — unlike the reference decoder this is
    /// checked over a whole candidate set at once (a single multi-target
    /// search), so there is no single "to" line to report.
    fn on_route_fail(
        &mut self,
        _from_anchor: usize,
        _to_anchor: usize,
        _from: LineId,
        _reason: &RouteMatchError,
    ) {
    }

    fn on_matching_fail(
        &mut self,
        _from_anchor: usize,
        _to_anchor: usize,
        _from_candidates: &[ObservedCandidate<LineId>],
        _to_candidates: &[ObservedCandidate<LineId>],
        _reason: &RouteMatchError,
    ) {
    }
}

/// An [`Observer`] that does nothing, used when a caller passes no observer
/// of their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl<LineId> Observer<LineId> for NullObserver {}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptedRoute<LineId> {
    pub from_anchor: usize,
    pub to_anchor: usize,
    pub from: LineId,
    pub to: Option<LineId>,
    pub success: bool,
    pub route: Option<Route<LineId>>,
    pub reason: Option<RouteMatchError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptedMatch<LineId> {
    pub from_anchor: usize,
    pub to_anchor: usize,
    pub from_candidates: Vec<ObservedCandidate<LineId>>,
    pub to_candidates: Vec<ObservedCandidate<LineId>>,
    pub reason: RouteMatchError,
}

/// A concrete [`Observer`] that records everything it sees, for tests and
/// callers who want decode diagnostics without writing their own sink.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver<LineId> {
    pub candidates: Vec<(usize, ObservedCandidate<LineId>)>,
    pub rejected_candidates: Vec<(usize, ObservedCandidate<LineId>, String)>,
    pub attempted_routes: Vec<AttemptedRoute<LineId>>,
    pub failed_matches: Vec<AttemptedMatch<LineId>>,
}

impl<LineId> RecordingObserver<LineId> {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            rejected_candidates: Vec::new(),
            attempted_routes: Vec::new(),
            failed_matches: Vec::new(),
        }
    }
}

impl<LineId: Copy> Observer<LineId> for RecordingObserver<LineId> {
    fn on_candidate_found(&mut self, anchor_index: usize, candidate: ObservedCandidate<LineId>) {
        self.candidates.push((anchor_index, candidate));
    }

    fn on_candidate_rejected(
        &mut self,
        anchor_index: usize,
        candidate: ObservedCandidate<LineId>,
        reason: &str,
    ) {
        self.rejected_candidates
            .push((anchor_index, candidate, reason.to_owned()));
    }

    fn on_route_success(
        &mut self,
        from_anchor: usize,
        to_anchor: usize,
        from: LineId,
        to: LineId,
        route: &Route<LineId>,
    ) {
        self.attempted_routes.push(AttemptedRoute {
            from_anchor,
            to_anchor,
            from,
            to: Some(to),
            success: true,
            route: Some(route.clone()),
            reason: None,
        });
    }

    fn on_route_fail(
        &mut self,
        from_anchor: usize,
        to_anchor: usize,
        from: LineId,
        reason: &RouteMatchError,
    ) {
        self.attempted_routes.push(AttemptedRoute {
            from_anchor,
            to_anchor,
            from,
            to: None,
            success: false,
            route: None,
            reason: Some(reason.clone()),
        });
    }

    fn on_matching_fail(
        &mut self,
        from_anchor: usize,
        to_anchor: usize,
        from_candidates: &[ObservedCandidate<LineId>],
        to_candidates: &[ObservedCandidate<LineId>],
        reason: &RouteMatchError,
    ) {
        self.failed_matches.push(AttemptedMatch {
            from_anchor,
            to_anchor,
            from_candidates: from_candidates.to_vec(),
            to_candidates: to_candidates.to_vec(),
            reason: reason.clone(),
        });
    }
}
