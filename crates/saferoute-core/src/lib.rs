pub mod geo;
pub mod models;
pub mod safety;
pub mod session;

pub use models::{
    Coordinate, DegenerateGeometry, Hazard, HazardCategory, HazardSeverity, InvalidCoordinate,
    LocationFix, Route, RouteInstruction, FALLBACK_INSTRUCTION,
};
pub use safety::{assess_route, compute_safety_score, SafetyReport};
pub use session::{NavigationSession, NavigationUpdate, SessionStatus};
