//! Nominatim geocoding client.
//!
//! Outside the navigation core: route acquisition receives coordinates
//! that are already resolved. This client exists for the CLI and any
//! outer surface that starts from free-text place names.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use saferoute_core::models::Coordinate;

use crate::traits::ProviderError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!("saferoute/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a Nominatim endpoint.
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    // Nominatim returns coordinates as strings.
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: String,
}

/// A resolved place.
#[derive(Debug, Clone)]
pub struct Place {
    pub coordinate: Coordinate,
    pub display_name: String,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Resolve a free-text query to its best-matching place, or `None`
    /// when nothing matches.
    pub async fn search(&self, query: &str) -> Result<Option<Place>, ProviderError> {
        let url = format!("{}/search", self.base_url);
        let results: Vec<SearchResult> = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?
            .json()
            .await?;

        let Some(result) = results.into_iter().next() else {
            return Ok(None);
        };
        let place = parse_place(result)?;
        Ok(Some(place))
    }

    /// Resolve a coordinate to a display address.
    pub async fn reverse(&self, coordinate: Coordinate) -> Result<String, ProviderError> {
        let url = format!("{}/reverse", self.base_url);
        let result: ReverseResult = self
            .client
            .get(&url)
            .query(&[
                ("format", "json"),
                ("lat", &coordinate.lat.to_string()),
                ("lon", &coordinate.lng.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;
        Ok(result.display_name)
    }
}

fn parse_place(result: SearchResult) -> Result<Place, ProviderError> {
    let lat: f64 = result
        .lat
        .parse()
        .map_err(|_| ProviderError::Malformed(format!("bad latitude: {}", result.lat)))?;
    let lng: f64 = result
        .lon
        .parse()
        .map_err(|_| ProviderError::Malformed(format!("bad longitude: {}", result.lon)))?;
    let coordinate = Coordinate::new(lat, lng)
        .map_err(|err| ProviderError::Malformed(err.to_string()))?;
    Ok(Place {
        coordinate,
        display_name: result.display_name,
    })
}
