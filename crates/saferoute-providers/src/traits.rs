//! Seams between the engine and its external collaborators.

use async_trait::async_trait;
use saferoute_core::models::{Coordinate, Hazard, RouteInstruction};

/// Routing profile requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Driving,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
        }
    }
}

/// Provider failure. All variants are recoverable: route acquisition
/// degrades to the straight-line fallback and hazard reads degrade to
/// an empty snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no route found between origin and destination")]
    NoRoute,
    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

/// A provider route before normalization into the internal `Route`.
#[derive(Debug, Clone)]
pub struct ProviderRoute {
    /// Polyline in travel order.
    pub geometry: Vec<Coordinate>,
    /// Maneuvers in travel order.
    pub instructions: Vec<RouteInstruction>,
    pub total_distance_m: f64,
    pub total_time_s: f64,
}

/// Turn-by-turn route computation (OSRM in production).
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Compute a route for the given profile: no alternatives, no
    /// intermediate waypoints.
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        profile: Profile,
    ) -> Result<ProviderRoute, ProviderError>;
}

/// Point-in-time read of the current hazard set.
#[async_trait]
pub trait AlertsSource: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<Hazard>, ProviderError>;
}
