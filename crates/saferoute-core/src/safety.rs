//! Safety scoring of a route against known hazard locations.
//!
//! The policy is a two-stage heuristic carried over from field use, not
//! a calibrated risk model: the tightest proximity band across all
//! hazards clamps the score, then each hazard within the relevance
//! radius subtracts a flat penalty. A single very close hazard therefore
//! dominates, while many distant hazards still erode the score.

use crate::geo;
use crate::models::{Coordinate, Hazard};

pub const MAX_SCORE: f64 = 10.0;
pub const MIN_SCORE: f64 = 1.0;

/// Hazards farther than this from every route point are ignored.
pub const RELEVANCE_RADIUS_KM: f64 = 20.0;

/// Flat per-hazard penalty applied after the band clamp.
pub const HAZARD_PENALTY: f64 = 0.5;

/// Score plus the inputs that produced it, for logging and display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyReport {
    /// Final score in [1.0, 10.0], one decimal of precision.
    pub score: f64,
    /// Hazards within the relevance radius of the route.
    pub relevant_hazards: usize,
    /// True when the route passes within 1 km of a hazard.
    pub direct_risk: bool,
}

impl SafetyReport {
    fn safe() -> Self {
        Self {
            score: MAX_SCORE,
            relevant_hazards: 0,
            direct_risk: false,
        }
    }
}

/// Compute the safety score for a route geometry. See [`assess_route`]
/// for the full breakdown.
pub fn compute_safety_score(geometry: &[Coordinate], hazards: &[Hazard]) -> f64 {
    assess_route(geometry, hazards).score
}

/// Score a route geometry against a hazard snapshot.
///
/// Pure and side-effect-free. An empty hazard set scores 10.0, the safe
/// default also used when the alerts source is unavailable.
pub fn assess_route(geometry: &[Coordinate], hazards: &[Hazard]) -> SafetyReport {
    if hazards.is_empty() {
        return SafetyReport::safe();
    }

    let mut score = MAX_SCORE;
    let mut relevant = 0usize;
    let mut direct_risk = false;

    for hazard in hazards {
        let min_distance_km = min_distance_to_route_km(hazard.coordinate, geometry);
        let Some(band) = proximity_band(min_distance_km) else {
            continue;
        };

        relevant += 1;
        if min_distance_km < 1.0 {
            direct_risk = true;
        }
        // Band clamp: only the tightest band across all hazards matters.
        score = score.min(band);
    }

    // Linear erosion by hazard count, floored at the minimum score.
    score = (score - HAZARD_PENALTY * relevant as f64).max(MIN_SCORE);

    SafetyReport {
        score: round_one_decimal(score.clamp(MIN_SCORE, MAX_SCORE)),
        relevant_hazards: relevant,
        direct_risk,
    }
}

/// Minimum great-circle distance from a point to any vertex of the
/// route polyline. Provider polylines are sampled densely enough that
/// vertex distance approximates distance to the path.
fn min_distance_to_route_km(point: Coordinate, geometry: &[Coordinate]) -> f64 {
    geometry
        .iter()
        .map(|p| geo::distance_km(point, *p))
        .fold(f64::INFINITY, f64::min)
}

/// Score ceiling for a hazard at the given distance, or `None` when the
/// hazard is outside the relevance radius.
fn proximity_band(min_distance_km: f64) -> Option<f64> {
    if min_distance_km < 1.0 {
        Some(3.0) // direct risk zone
    } else if min_distance_km < 5.0 {
        Some(5.0)
    } else if min_distance_km < 10.0 {
        Some(7.0)
    } else if min_distance_km < RELEVANCE_RADIUS_KM {
        Some(8.0)
    } else {
        None
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
