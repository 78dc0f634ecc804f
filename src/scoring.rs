//! Per-criterion candidate scoring and its weighted combination.
//!
//! Four independent scores in `[0, 1]` — geographic proximity, bearing
//! alignment, road-class match, form-of-way match — combined by a
//! configurable convex combination. Each `score_*` function here is pure and
//! total: none of them can fail, they only ever return a number in `[0, 1]`.

use crate::model::{Bearing, Fow, Frc, Length};

/// The weight each of the four scores contributes to a candidate's combined
/// score. Does not need to sum to 1, though in practice it should.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub geo: f64,
    pub bear: f64,
    pub frc: f64,
    pub fow: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            geo: 0.25,
            bear: 0.25,
            frc: 0.25,
            fow: 0.25,
        }
    }
}

/// `1 - d / search_radius`, floored at zero: a candidate right at the anchor
/// scores 1.0, one at the search radius scores 0.0.
pub fn score_geo(distance: Length, search_radius: Length) -> f64 {
    if search_radius.is_zero() {
        return if distance.is_zero() { 1.0 } else { 0.0 };
    }
    (1.0 - distance.meters() / search_radius.meters()).max(0.0)
}

/// `1 - min_circular_diff(a, b) / 180`: identical bearings score 1.0,
/// opposite bearings score 0.0.
pub fn score_angle_difference(a: Bearing, b: Bearing) -> f64 {
    1.0 - a.circular_difference(b) / 180.0
}

/// `1 - |a - b| / 7`, the ordinal distance between two road classes
/// normalized by the widest possible gap.
pub fn score_frc(a: Frc, b: Frc) -> f64 {
    1.0 - a.ordinal_distance(b) as f64 / 7.0
}

/// Default form-of-way similarity matrix: `fow_standin_score[anchor][candidate]`.
/// Adopted verbatim (including its asymmetries) from the reference decoder's
/// `DEFAULT_FOW_STAND_IN_SCORE`, itself adopted from the OpenLR Java
/// implementation. Indices follow [`Fow`]'s declaration order: undefined,
/// motorway, multiple carriageway, single carriageway, roundabout, traffic
/// square, slip road, other.
pub const DEFAULT_FOW_STAND_IN_SCORE: [[f64; 8]; 8] = [
    [0.50, 0.50, 0.50, 0.50, 0.50, 0.50, 0.50, 0.50],
    [0.50, 1.00, 0.75, 0.00, 0.00, 0.00, 0.00, 0.00],
    [0.50, 0.75, 1.00, 0.75, 0.50, 0.00, 0.00, 0.00],
    [0.50, 0.00, 0.75, 1.00, 0.50, 0.50, 0.00, 0.00],
    [0.50, 0.00, 0.50, 0.50, 1.00, 0.50, 0.00, 0.00],
    [0.50, 0.00, 0.00, 0.50, 0.50, 1.00, 0.00, 0.00],
    [0.50, 0.00, 0.00, 0.00, 0.00, 0.00, 1.00, 0.00],
    [0.50, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 1.00],
];

/// Table lookup into a `fow_standin_score` matrix (`[anchor][candidate]`),
/// taking the matrix by reference so a [`crate::DecoderConfig`] can
/// carry a customized one.
pub fn score_fow(matrix: &[[f64; 8]; 8], anchor: Fow, candidate: Fow) -> f64 {
    matrix[anchor as usize][candidate as usize]
}

/// Weighted convex combination of the four per-criterion scores.
pub fn combine(weights: ScoringWeights, geo: f64, bear: f64, frc: f64, fow: f64) -> f64 {
    weights.geo * geo + weights.bear * bear + weights.frc * frc + weights.fow * fow
}
