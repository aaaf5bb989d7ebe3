//! One-shot route planning: acquire, then score against the current
//! hazard snapshot.

use std::sync::Arc;

use saferoute_core::geo;
use saferoute_core::models::{Coordinate, InvalidCoordinate, Route};
use saferoute_core::safety::{assess_route, SafetyReport};
use saferoute_providers::RoutingProvider;

use crate::acquire::RouteAcquirer;
use crate::hazards::HazardStore;

/// Payload for the safety-score consumer, emitted on every successful
/// or fallback acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub score: f64,
    pub total_distance_km: f64,
    pub estimated_time_minutes: i64,
}

/// A route together with its safety assessment.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    pub route: Arc<Route>,
    pub report: SafetyReport,
    pub summary: RouteSummary,
}

/// Plans and scores routes. Holds no mutable state of its own; the
/// hazard store is shared with the refresh loop.
pub struct RoutePlanner<P> {
    acquirer: Arc<RouteAcquirer<P>>,
    hazards: Arc<HazardStore>,
}

impl<P: RoutingProvider> RoutePlanner<P> {
    pub fn new(acquirer: Arc<RouteAcquirer<P>>, hazards: Arc<HazardStore>) -> Self {
        Self { acquirer, hazards }
    }

    pub fn acquirer(&self) -> &Arc<RouteAcquirer<P>> {
        &self.acquirer
    }

    pub fn hazards(&self) -> &Arc<HazardStore> {
        &self.hazards
    }

    /// Plan a route and score it against the current hazard snapshot.
    ///
    /// An empty or never-filled hazard store scores 10.0 ("no known
    /// hazards"); a provider failure scores the fallback line the same
    /// way as any other geometry.
    pub async fn plan(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<PlannedRoute, InvalidCoordinate> {
        let route = self.acquirer.acquire(origin, destination).await?;
        let hazards = self.hazards.snapshot();
        let report = assess_route(&route.geometry, &hazards);

        let total_distance_km = route.total_distance_km();
        let estimated_time_minutes = if route.total_time_s > 0.0 {
            (route.total_time_s / 60.0).round() as i64
        } else {
            geo::estimate_travel_minutes(total_distance_km)
        };

        tracing::info!(
            score = report.score,
            relevant_hazards = report.relevant_hazards,
            direct_risk = report.direct_risk,
            distance_km = total_distance_km,
            fallback = route.is_fallback,
            "route planned"
        );

        Ok(PlannedRoute {
            route,
            report,
            summary: RouteSummary {
                score: report.score,
                total_distance_km,
                estimated_time_minutes,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use async_trait::async_trait;
    use saferoute_core::models::{Hazard, HazardCategory, HazardSeverity};
    use saferoute_providers::{Profile, ProviderError, ProviderRoute};
    use std::time::Duration;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    fn test_config() -> Config {
        Config {
            osrm_url: String::new(),
            alerts_url: String::new(),
            nominatim_url: String::new(),
            provider_timeout: Duration::from_millis(200),
            first_fix_timeout: Duration::from_millis(200),
            hazard_refresh_interval: Duration::from_secs(60),
            route_cache_max_entries: 8,
            route_cache_max_age: Duration::from_secs(300),
        }
    }

    struct LineProvider;

    #[async_trait]
    impl RoutingProvider for LineProvider {
        async fn route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
            _profile: Profile,
        ) -> Result<ProviderRoute, ProviderError> {
            Ok(ProviderRoute {
                geometry: vec![origin, destination],
                instructions: vec![],
                total_distance_m: 10_000.0,
                total_time_s: 900.0,
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl RoutingProvider for DownProvider {
        async fn route(
            &self,
            _origin: Coordinate,
            _destination: Coordinate,
            _profile: Profile,
        ) -> Result<ProviderRoute, ProviderError> {
            Err(ProviderError::NoRoute)
        }
    }

    fn planner<P: RoutingProvider>(provider: P) -> RoutePlanner<P> {
        RoutePlanner::new(
            Arc::new(RouteAcquirer::new(provider, &test_config())),
            Arc::new(HazardStore::new()),
        )
    }

    #[tokio::test]
    async fn empty_hazard_store_scores_ten() {
        let planner = planner(LineProvider);
        let planned = planner.plan(coord(34.0, 74.8), coord(34.1, 74.9)).await.unwrap();
        assert_eq!(planned.summary.score, 10.0);
        assert_eq!(planned.summary.total_distance_km, 10.0);
        assert_eq!(planned.summary.estimated_time_minutes, 15);
    }

    #[tokio::test]
    async fn hazard_near_route_lowers_score() {
        let planner = planner(LineProvider);
        planner.hazards().replace_all(vec![Hazard {
            coordinate: coord(34.05, 74.85),
            category: HazardCategory::Protest,
            severity: HazardSeverity::High,
            description: "blockade".into(),
            region: None,
        }]);

        let planned = planner.plan(coord(34.0, 74.8), coord(34.1, 74.9)).await.unwrap();
        assert!(planned.summary.score < 10.0);
        assert_eq!(planned.report.relevant_hazards, 1);
    }

    #[tokio::test]
    async fn provider_outage_still_produces_a_scored_plan() {
        let planner = planner(DownProvider);
        let planned = planner.plan(coord(34.0, 74.8), coord(34.1, 74.9)).await.unwrap();
        assert!(planned.route.is_fallback);
        assert_eq!(planned.summary.score, 10.0);
        // Fallback timing comes from the fixed average speed.
        assert!(planned.summary.estimated_time_minutes > 0);
    }
}
