//! Shared hazard snapshot store and its refresh loop.
//!
//! The store is replaced wholesale on each successful snapshot read;
//! rows are keyed by description, so a feed that re-reports the same
//! incident does not inflate the hazard count (and with it the safety
//! penalty).

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::interval;

use saferoute_core::models::Hazard;
use saferoute_providers::{AlertsSource, ProviderError};

use crate::backoff::Backoff;

/// In-memory hazard set, deduplicated by description.
#[derive(Default)]
pub struct HazardStore {
    by_description: DashMap<String, Hazard>,
}

impl HazardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set with a fresh snapshot.
    pub fn replace_all(&self, hazards: Vec<Hazard>) {
        self.by_description.clear();
        for hazard in hazards {
            self.by_description.insert(hazard.description.clone(), hazard);
        }
    }

    /// Point-in-time copy of the current hazard set.
    pub fn snapshot(&self) -> Vec<Hazard> {
        self.by_description.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_description.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_description.is_empty()
    }
}

/// Pull one snapshot from the source into the store. Returns the number
/// of hazards after deduplication.
pub async fn refresh_once<A: AlertsSource>(
    store: &HazardStore,
    source: &A,
) -> Result<usize, ProviderError> {
    let hazards = source.snapshot().await?;
    store.replace_all(hazards);
    Ok(store.len())
}

/// Periodically refresh the store from the alerts source.
///
/// Source failures leave the previous snapshot in place and back off
/// exponentially; the score calculator treats a never-filled store as
/// "no known hazards".
pub async fn run_refresh_loop<A: AlertsSource>(
    store: Arc<HazardStore>,
    source: A,
    refresh_interval: Duration,
) {
    let mut ticker = interval(refresh_interval);
    let mut backoff = Backoff::new(refresh_interval, refresh_interval.saturating_mul(8));

    loop {
        ticker.tick().await;

        if !backoff.ready() {
            continue;
        }

        match refresh_once(store.as_ref(), &source).await {
            Ok(count) => {
                backoff.succeeded();
                tracing::debug!(hazards = count, "hazard snapshot refreshed");
            }
            Err(err) => {
                let delay = backoff.failed();
                tracing::warn!("alerts source unavailable ({err}); retrying in {delay:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use saferoute_core::models::{Coordinate, HazardCategory, HazardSeverity};

    fn hazard(description: &str) -> Hazard {
        Hazard {
            coordinate: Coordinate { lat: 34.0, lng: 74.8 },
            category: HazardCategory::Other,
            severity: HazardSeverity::Medium,
            description: description.to_string(),
            region: None,
        }
    }

    struct StaticSource(Vec<Hazard>);

    #[async_trait]
    impl AlertsSource for StaticSource {
        async fn snapshot(&self) -> Result<Vec<Hazard>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl AlertsSource for FailingSource {
        async fn snapshot(&self) -> Result<Vec<Hazard>, ProviderError> {
            Err(ProviderError::Malformed("feed down".into()))
        }
    }

    #[test]
    fn duplicate_descriptions_collapse() {
        let store = HazardStore::new();
        store.replace_all(vec![hazard("same incident"), hazard("same incident"), hazard("other")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn replace_all_drops_previous_snapshot() {
        let store = HazardStore::new();
        store.replace_all(vec![hazard("old")]);
        store.replace_all(vec![hazard("new")]);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].description, "new");
    }

    #[tokio::test]
    async fn refresh_once_fills_the_store() {
        let store = HazardStore::new();
        let count = refresh_once(&store, &StaticSource(vec![hazard("a"), hazard("b")]))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_snapshot() {
        let store = HazardStore::new();
        store.replace_all(vec![hazard("still here")]);
        assert!(refresh_once(&store, &FailingSource).await.is_err());
        assert_eq!(store.len(), 1);
    }
}
