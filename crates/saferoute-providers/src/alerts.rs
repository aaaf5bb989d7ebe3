//! Alerts feed HTTP client.
//!
//! Reads point-in-time snapshots of the hazard set from the alerts
//! backend (`GET /api/alerts`). Rows carry `lat`/`lng`/`severity`/
//! `description`/`city`; category and missing severities are derived
//! from the description keywords.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use saferoute_core::models::{Coordinate, Hazard, HazardSeverity};

use crate::classify;
use crate::traits::{AlertsSource, ProviderError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the alerts backend.
pub struct HttpAlertsSource {
    client: Client,
    base_url: String,
}

impl HttpAlertsSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AlertsSource for HttpAlertsSource {
    async fn snapshot(&self) -> Result<Vec<Hazard>, ProviderError> {
        let url = format!("{}/api/alerts", self.base_url);
        let rows: Vec<RawAlert> = self.client.get(&url).send().await?.json().await?;
        Ok(convert_alerts(rows))
    }
}

/// One row of the alerts feed, as written by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAlert {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub severity: Option<String>,
    pub description: String,
    #[serde(default)]
    pub city: Option<String>,
}

/// Convert feed rows into hazards, dropping rows with out-of-range
/// coordinates rather than letting them poison the distance math.
pub fn convert_alerts(rows: Vec<RawAlert>) -> Vec<Hazard> {
    rows.into_iter()
        .filter_map(|row| match Coordinate::new(row.lat, row.lng) {
            Ok(coordinate) => Some(Hazard {
                coordinate,
                category: classify::classify_category(&row.description),
                severity: parse_severity(row.severity.as_deref(), &row.description),
                description: row.description,
                region: row.city,
            }),
            Err(err) => {
                tracing::warn!("dropping alert with invalid coordinates: {err}");
                None
            }
        })
        .collect()
}

fn parse_severity(raw: Option<&str>, description: &str) -> HazardSeverity {
    match raw.map(str::trim).map(str::to_lowercase).as_deref() {
        Some("high") => HazardSeverity::High,
        Some("medium") => HazardSeverity::Medium,
        Some("low") => HazardSeverity::Low,
        _ => classify::classify_severity(description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saferoute_core::models::HazardCategory;

    #[test]
    fn converts_feed_rows() {
        let rows: Vec<RawAlert> = serde_json::from_str(
            r#"[
                {"lat": 34.0159, "lng": 75.3187, "severity": "high",
                 "description": "Terror attack reported - area cordoned off", "city": "Pahalgam"},
                {"lat": 34.0837, "lng": 74.7973,
                 "description": "Protest march expected downtown", "city": "Srinagar"}
            ]"#,
        )
        .unwrap();

        let hazards = convert_alerts(rows);
        assert_eq!(hazards.len(), 2);
        assert_eq!(hazards[0].severity, HazardSeverity::High);
        assert_eq!(hazards[0].category, HazardCategory::Terrorism);
        assert_eq!(hazards[0].region.as_deref(), Some("Pahalgam"));
        // No severity field: derived from the description keywords.
        assert_eq!(hazards[1].category, HazardCategory::Protest);
        assert_eq!(hazards[1].severity, HazardSeverity::Medium);
    }

    #[test]
    fn invalid_coordinates_are_dropped() {
        let rows = vec![RawAlert {
            lat: 934.0,
            lng: 74.8,
            severity: Some("high".into()),
            description: "corrupt row".into(),
            city: None,
        }];
        assert!(convert_alerts(rows).is_empty());
    }

    #[test]
    fn unknown_severity_falls_back_to_keywords() {
        assert_eq!(
            parse_severity(Some("catastrophic"), "bomb threat at the station"),
            HazardSeverity::High
        );
        assert_eq!(parse_severity(None, "minor road closure"), HazardSeverity::Low);
    }
}
