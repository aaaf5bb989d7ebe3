//! Route acquisition against the external routing provider.
//!
//! Acquisition never fails for provider reasons: any provider error,
//! timeout, or empty result degrades to the straight-line fallback
//! route. Only out-of-range coordinates are rejected, at this boundary,
//! before any geospatial math runs.
//!
//! Identical `(origin, destination)` requests are coalesced: repeat
//! acquisitions (UI re-renders are the classic trigger) share one
//! in-flight provider call and then hit the completed-route cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::OnceCell;

use saferoute_core::models::{Coordinate, InvalidCoordinate, Route};
use saferoute_providers::{Profile, RoutingProvider};

use crate::cache::{evict_stale, Aged};
use crate::config::Config;

/// Cache key with coordinates quantized to microdegrees, so float noise
/// from the same UI state maps to the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RouteKey {
    origin_lat: i64,
    origin_lng: i64,
    dest_lat: i64,
    dest_lng: i64,
}

impl RouteKey {
    fn new(origin: Coordinate, destination: Coordinate) -> Self {
        const MICRO: f64 = 1e6;
        Self {
            origin_lat: (origin.lat * MICRO).round() as i64,
            origin_lng: (origin.lng * MICRO).round() as i64,
            dest_lat: (destination.lat * MICRO).round() as i64,
            dest_lng: (destination.lng * MICRO).round() as i64,
        }
    }
}

struct CacheSlot {
    cell: Arc<OnceCell<Arc<Route>>>,
    created_at: Instant,
}

impl CacheSlot {
    fn new() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            created_at: Instant::now(),
        }
    }
}

impl Aged for CacheSlot {
    fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// Acquires, caches, and deduplicates routes from a routing provider.
pub struct RouteAcquirer<P> {
    provider: P,
    provider_timeout: Duration,
    cache: DashMap<RouteKey, CacheSlot>,
    cache_max_entries: usize,
    cache_max_age: Duration,
}

impl<P: RoutingProvider> RouteAcquirer<P> {
    pub fn new(provider: P, config: &Config) -> Self {
        Self {
            provider,
            provider_timeout: config.provider_timeout,
            cache: DashMap::new(),
            cache_max_entries: config.route_cache_max_entries,
            cache_max_age: config.route_cache_max_age,
        }
    }

    /// Acquire a route between two already-resolved coordinates.
    ///
    /// Always returns a usable route (fallback on provider failure);
    /// errs only on out-of-range coordinates.
    pub async fn acquire(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Arc<Route>, InvalidCoordinate> {
        origin.validate()?;
        destination.validate()?;

        let key = RouteKey::new(origin, destination);
        // Clone the cell out so the shard lock is not held across await.
        let cell = {
            let slot = self.cache.entry(key).or_insert_with(CacheSlot::new);
            Arc::clone(&slot.cell)
        };

        let route = cell
            .get_or_init(|| async { Arc::new(self.fetch(origin, destination).await) })
            .await
            .clone();

        evict_stale(&self.cache, self.cache_max_entries, self.cache_max_age);
        Ok(route)
    }

    async fn fetch(&self, origin: Coordinate, destination: Coordinate) -> Route {
        let request = self.provider.route(origin, destination, Profile::Driving);
        match tokio::time::timeout(self.provider_timeout, request).await {
            Ok(Ok(provider_route)) => {
                match Route::from_provider(
                    provider_route.geometry,
                    provider_route.instructions,
                    provider_route.total_distance_m,
                    provider_route.total_time_s,
                ) {
                    Ok(route) => {
                        tracing::debug!(
                            distance_m = route.total_distance_m,
                            steps = route.instructions.len(),
                            "route acquired from provider"
                        );
                        route
                    }
                    Err(err) => {
                        tracing::warn!("provider route unusable ({err}); using straight-line fallback");
                        Route::fallback(origin, destination)
                    }
                }
            }
            Ok(Err(err)) => {
                tracing::warn!("routing provider failed ({err}); using straight-line fallback");
                Route::fallback(origin, destination)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_s = self.provider_timeout.as_secs(),
                    "routing provider timed out; using straight-line fallback"
                );
                Route::fallback(origin, destination)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use saferoute_providers::{ProviderError, ProviderRoute};
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    /// Counts calls; behavior configured per test.
    struct StubProvider {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl StubProvider {
        fn ok() -> Self {
            Self { calls: AtomicUsize::new(0), fail: false, delay: Duration::ZERO }
        }

        fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), fail: true, delay: Duration::ZERO }
        }

        fn slow(delay: Duration) -> Self {
            Self { calls: AtomicUsize::new(0), fail: false, delay }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RoutingProvider for StubProvider {
        async fn route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
            _profile: Profile,
        ) -> Result<ProviderRoute, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(ProviderError::NoRoute);
            }
            Ok(ProviderRoute {
                geometry: vec![origin, coord(33.9, 74.9), destination],
                instructions: vec![],
                total_distance_m: 42_000.0,
                total_time_s: 2520.0,
            })
        }
    }

    #[tokio::test]
    async fn provider_failure_yields_fallback_route() {
        let acquirer = RouteAcquirer::new(StubProvider::failing(), &test_config());
        let route = acquirer
            .acquire(coord(34.0837, 74.7973), coord(34.0159, 75.3187))
            .await
            .unwrap();

        assert!(route.is_fallback);
        assert_eq!(route.geometry.len(), 2);
        assert_eq!(route.instructions.len(), 1);
    }

    #[tokio::test]
    async fn provider_timeout_yields_fallback_route() {
        let acquirer =
            RouteAcquirer::new(StubProvider::slow(Duration::from_secs(5)), &test_config());
        let route = acquirer
            .acquire(coord(34.0837, 74.7973), coord(34.0159, 75.3187))
            .await
            .unwrap();
        assert!(route.is_fallback);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected() {
        let acquirer = RouteAcquirer::new(StubProvider::ok(), &test_config());
        let err = acquirer.acquire(coord(91.0, 0.0), coord(0.0, 0.0)).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn repeat_acquisition_hits_the_cache() {
        let acquirer = RouteAcquirer::new(StubProvider::ok(), &test_config());
        let origin = coord(34.0837, 74.7973);
        let destination = coord(34.0159, 75.3187);

        let first = acquirer.acquire(origin, destination).await.unwrap();
        let second = acquirer.acquire(origin, destination).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(acquirer.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_share_one_provider_call() {
        let acquirer = Arc::new(RouteAcquirer::new(
            StubProvider::slow(Duration::from_millis(50)),
            &test_config(),
        ));
        let origin = coord(34.0837, 74.7973);
        let destination = coord(34.0159, 75.3187);

        let a = {
            let acquirer = Arc::clone(&acquirer);
            tokio::spawn(async move { acquirer.acquire(origin, destination).await })
        };
        let b = {
            let acquirer = Arc::clone(&acquirer);
            tokio::spawn(async move { acquirer.acquire(origin, destination).await })
        };

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(acquirer.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn nearby_float_noise_maps_to_the_same_key() {
        let origin = coord(34.0837, 74.7973);
        let destination = coord(34.0159, 75.3187);
        let jittered = coord(34.0837 + 1e-9, 74.7973 - 1e-9);
        assert_eq!(
            RouteKey::new(origin, destination),
            RouteKey::new(jittered, destination)
        );
    }
}
