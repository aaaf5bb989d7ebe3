//! OSRM routing API HTTP client.
//!
//! Speaks the `route/v1` service with GeoJSON geometry and step-level
//! maneuvers, the same request shape the original map frontend issued
//! through its routing control.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use saferoute_core::models::{Coordinate, RouteInstruction};

use crate::traits::{Profile, ProviderError, ProviderRoute, RoutingProvider};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for an OSRM `route/v1` endpoint.
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    /// Create a client against the given OSRM base URL
    /// (e.g. `https://router.project-osrm.org`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RoutingProvider for OsrmClient {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        profile: Profile,
    ) -> Result<ProviderRoute, ProviderError> {
        // OSRM takes lng,lat pairs.
        let url = format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url,
            profile.as_str(),
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat,
        );

        let response: OsrmResponse = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "true"),
                ("alternatives", "false"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if response.code != "Ok" {
            tracing::debug!(code = %response.code, "OSRM returned non-Ok code");
            return Err(ProviderError::NoRoute);
        }
        let route = response.routes.into_iter().next().ok_or(ProviderError::NoRoute)?;
        normalize_route(route)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON positions: `[lng, lat]`.
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    duration: f64,
    #[serde(default)]
    name: String,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    /// `[lng, lat]` of the maneuver point.
    location: [f64; 2],
    #[serde(rename = "type")]
    maneuver_type: String,
    #[serde(default)]
    modifier: Option<String>,
}

fn normalize_route(route: OsrmRoute) -> Result<ProviderRoute, ProviderError> {
    let geometry: Vec<Coordinate> = route
        .geometry
        .coordinates
        .iter()
        .map(|pos| Coordinate { lat: pos[1], lng: pos[0] })
        .collect();

    if geometry.len() < 2 {
        return Err(ProviderError::Malformed(format!(
            "route geometry has {} points",
            geometry.len()
        )));
    }

    let instructions: Vec<RouteInstruction> = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(|step| RouteInstruction {
            text: step_text(step),
            coordinate: Coordinate {
                lat: step.maneuver.location[1],
                lng: step.maneuver.location[0],
            },
            distance_m: step.distance,
            time_s: step.duration,
        })
        .collect();

    Ok(ProviderRoute {
        geometry,
        instructions,
        total_distance_m: route.distance,
        total_time_s: route.duration,
    })
}

/// Render a maneuver as user-facing instruction text.
fn step_text(step: &OsrmStep) -> String {
    let road = step.name.trim();
    let modifier = step.maneuver.modifier.as_deref().unwrap_or("");

    match step.maneuver.maneuver_type.as_str() {
        "depart" => {
            if road.is_empty() {
                "Head out".to_string()
            } else {
                format!("Head out on {road}")
            }
        }
        "arrive" => "You have arrived at your destination".to_string(),
        "turn" | "end of road" | "fork" => {
            let direction = if modifier.is_empty() { "ahead" } else { modifier };
            if road.is_empty() {
                format!("Turn {direction}")
            } else {
                format!("Turn {direction} onto {road}")
            }
        }
        "roundabout" | "rotary" => {
            if road.is_empty() {
                "Take the roundabout".to_string()
            } else {
                format!("Take the roundabout onto {road}")
            }
        }
        "merge" => {
            if road.is_empty() {
                "Merge".to_string()
            } else {
                format!("Merge onto {road}")
            }
        }
        _ => {
            if road.is_empty() {
                "Continue".to_string()
            } else {
                format!("Continue on {road}")
            }
        }
    }
}
