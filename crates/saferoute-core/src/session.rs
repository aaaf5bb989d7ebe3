//! Navigation session state machine.
//!
//! A session tracks progress along one planned route from a stream of
//! location fixes. The transition function is synchronous; delivery of
//! fixes (subscription, channel, callback) is the caller's concern.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo;
use crate::models::{LocationFix, Route, FALLBACK_INSTRUCTION};

/// Lifecycle of a navigation session.
///
/// `AwaitingFix` is initial; the first accepted fix moves the session to
/// `Active`. `Stopped` is terminal — restarting navigation creates a
/// fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    AwaitingFix,
    Active,
    Stopped,
}

/// What the user should be told after a fix is accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationUpdate {
    pub step_text: String,
    pub remaining_distance_km: f64,
    pub remaining_time_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
}

/// Live progress along a planned route.
///
/// Mutated only by [`on_location_fix`](Self::on_location_fix) and
/// [`stop`](Self::stop). The route itself is shared and immutable.
#[derive(Debug)]
pub struct NavigationSession {
    route: Arc<Route>,
    status: SessionStatus,
    current_location: Option<LocationFix>,
    current_step_index: usize,
    remaining_distance_m: f64,
    remaining_time_s: f64,
    last_fix_at: Option<DateTime<Utc>>,
}

impl NavigationSession {
    /// Create a session in `AwaitingFix` with the full route remaining.
    pub fn new(route: Arc<Route>) -> Self {
        let remaining_distance_m = route.total_distance_m;
        let remaining_time_s = route.total_time_s;
        Self {
            route,
            status: SessionStatus::AwaitingFix,
            current_location: None,
            current_step_index: 0,
            remaining_distance_m,
            remaining_time_s,
            last_fix_at: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn current_location(&self) -> Option<&LocationFix> {
        self.current_location.as_ref()
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn remaining_distance_m(&self) -> f64 {
        self.remaining_distance_m
    }

    pub fn remaining_time_s(&self) -> f64 {
        self.remaining_time_s
    }

    /// Accept a location fix and recompute progress.
    ///
    /// Returns `None` when the fix is discarded: the session is stopped,
    /// or the fix is older than the last accepted one (the location
    /// subsystem may deliver out of order; stale fixes must not rewind
    /// progress). Identical repeated fixes are accepted and yield
    /// identical updates.
    pub fn on_location_fix(&mut self, fix: &LocationFix) -> Option<NavigationUpdate> {
        if self.status == SessionStatus::Stopped {
            return None;
        }
        if let Some(last) = self.last_fix_at {
            if fix.timestamp < last {
                return None;
            }
        }

        self.last_fix_at = Some(fix.timestamp);
        self.current_location = Some(fix.clone());
        self.status = SessionStatus::Active;

        let instructions = &self.route.instructions;
        if instructions.is_empty() {
            // No maneuver list yet; report whole-route remainders.
            self.current_step_index = 0;
            self.remaining_distance_m = self.route.total_distance_m;
            self.remaining_time_s = self.route.total_time_s;
            return Some(self.build_update(FALLBACK_INSTRUCTION.to_string(), fix));
        }

        // Nearest instruction anchor wins; on a tie the earlier step is
        // kept so ambiguous equidistant fixes never snap forward.
        let mut best_index = 0usize;
        let mut best_distance = f64::INFINITY;
        for (index, instruction) in instructions.iter().enumerate() {
            let d = geo::distance_km(fix.coordinate, instruction.coordinate);
            if d < best_distance {
                best_distance = d;
                best_index = index;
            }
        }

        self.current_step_index = best_index;
        self.remaining_distance_m = instructions[best_index..].iter().map(|i| i.distance_m).sum();
        self.remaining_time_s = instructions[best_index..].iter().map(|i| i.time_s).sum();

        Some(self.build_update(instructions[best_index].text.clone(), fix))
    }

    /// Terminate the session. Later fixes are ignored.
    pub fn stop(&mut self) {
        self.status = SessionStatus::Stopped;
    }

    fn build_update(&self, step_text: String, fix: &LocationFix) -> NavigationUpdate {
        NavigationUpdate {
            step_text,
            remaining_distance_km: self.remaining_distance_m / 1000.0,
            remaining_time_minutes: (self.remaining_time_s / 60.0).round() as i64,
            heading_deg: fix.heading_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, RouteInstruction};
    use chrono::TimeZone;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    fn fix_at(lat: f64, lng: f64, secs: i64) -> LocationFix {
        LocationFix {
            coordinate: coord(lat, lng),
            heading_deg: None,
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap(),
        }
    }

    /// Three-step route heading north: anchors at 33.0, 33.1, 33.2.
    fn three_step_route() -> Arc<Route> {
        let anchors = [coord(33.0, 74.8), coord(33.1, 74.8), coord(33.2, 74.8)];
        let distances = [2000.0, 3000.0, 1000.0];
        let times = [120.0, 180.0, 60.0];
        let instructions = anchors
            .iter()
            .zip(distances.iter().zip(times.iter()))
            .enumerate()
            .map(|(i, (c, (d, t)))| RouteInstruction {
                text: format!("step {i}"),
                coordinate: *c,
                distance_m: *d,
                time_s: *t,
            })
            .collect();
        Arc::new(
            Route::from_provider(anchors.to_vec(), instructions, 6000.0, 360.0).unwrap(),
        )
    }

    #[test]
    fn first_fix_activates_session() {
        let mut session = NavigationSession::new(three_step_route());
        assert_eq!(session.status(), SessionStatus::AwaitingFix);

        let update = session.on_location_fix(&fix_at(33.0, 74.8, 0)).unwrap();
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.current_step_index(), 0);
        assert_eq!(update.step_text, "step 0");
        assert_eq!(update.remaining_distance_km, 6.0);
        assert_eq!(update.remaining_time_minutes, 6);
    }

    #[test]
    fn fix_near_middle_step_sums_remaining_tail() {
        let mut session = NavigationSession::new(three_step_route());
        session.on_location_fix(&fix_at(33.11, 74.8, 0)).unwrap();

        assert_eq!(session.current_step_index(), 1);
        assert_eq!(session.remaining_distance_m(), 4000.0);
        assert_eq!(session.remaining_time_s(), 240.0);
    }

    #[test]
    fn equidistant_fix_keeps_the_earlier_step() {
        let mut session = NavigationSession::new(three_step_route());
        // Exactly between anchors 0 and 1.
        session.on_location_fix(&fix_at(33.05, 74.8, 0)).unwrap();
        assert_eq!(session.current_step_index(), 0);
    }

    #[test]
    fn repeated_identical_fix_is_idempotent() {
        let mut session = NavigationSession::new(three_step_route());
        let fix = fix_at(33.11, 74.8, 5);
        let first = session.on_location_fix(&fix).unwrap();
        let second = session.on_location_fix(&fix).unwrap();
        assert_eq!(first, second);
        assert_eq!(session.current_step_index(), 1);
    }

    #[test]
    fn stale_fix_is_discarded() {
        let mut session = NavigationSession::new(three_step_route());
        session.on_location_fix(&fix_at(33.11, 74.8, 10)).unwrap();
        assert_eq!(session.current_step_index(), 1);

        // Out-of-order delivery: older than the last accepted fix.
        assert!(session.on_location_fix(&fix_at(33.0, 74.8, 3)).is_none());
        assert_eq!(session.current_step_index(), 1);
    }

    #[test]
    fn stopped_session_ignores_fixes() {
        let mut session = NavigationSession::new(three_step_route());
        session.on_location_fix(&fix_at(33.0, 74.8, 0)).unwrap();
        session.stop();
        assert_eq!(session.status(), SessionStatus::Stopped);
        assert!(session.on_location_fix(&fix_at(33.1, 74.8, 1)).is_none());
    }

    #[test]
    fn fallback_route_reports_its_single_step() {
        let route = Arc::new(Route::fallback(coord(33.0, 74.8), coord(33.2, 74.8)));
        let mut session = NavigationSession::new(route);
        let update = session.on_location_fix(&fix_at(33.0, 74.8, 0)).unwrap();
        assert_eq!(update.step_text, FALLBACK_INSTRUCTION);
        assert!(update.remaining_distance_km > 0.0);
    }

    #[test]
    fn heading_is_passed_through() {
        let mut session = NavigationSession::new(three_step_route());
        let mut fix = fix_at(33.0, 74.8, 0);
        fix.heading_deg = Some(42.5);
        let update = session.on_location_fix(&fix).unwrap();
        assert_eq!(update.heading_deg, Some(42.5));
    }
}
