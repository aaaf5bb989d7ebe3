//! Route planning and live navigation engine.
//!
//! Wires the pure scoring/session logic from `saferoute-core` to the
//! network providers in `saferoute-providers`: route acquisition with
//! caching and fallback, a shared hazard store with a background
//! refresh loop, one-shot route planning, and task-based navigation
//! sessions.

pub mod acquire;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod hazards;
pub mod navigator;
pub mod planner;

pub use acquire::RouteAcquirer;
pub use backoff::Backoff;
pub use config::Config;
pub use hazards::{refresh_once, run_refresh_loop, HazardStore};
pub use navigator::{
    start_navigation, start_navigation_to, AcquireRoute, NavigationEvent, NavigationHandle,
};
pub use planner::{PlannedRoute, RoutePlanner, RouteSummary};
