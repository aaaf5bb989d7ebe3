//! Engine configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// OSRM base URL, `SAFEROUTE_OSRM_URL`.
    pub osrm_url: String,
    /// Alerts backend base URL, `SAFEROUTE_ALERTS_URL`.
    pub alerts_url: String,
    /// Nominatim base URL, `SAFEROUTE_NOMINATIM_URL`.
    pub nominatim_url: String,
    /// Routing provider call budget before falling back.
    pub provider_timeout: Duration,
    /// How long to wait for the first location fix before reporting
    /// the location as unavailable.
    pub first_fix_timeout: Duration,
    /// Hazard snapshot refresh cadence.
    pub hazard_refresh_interval: Duration,
    pub route_cache_max_entries: usize,
    pub route_cache_max_age: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            osrm_url: env::var("SAFEROUTE_OSRM_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            alerts_url: env::var("SAFEROUTE_ALERTS_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            nominatim_url: env::var("SAFEROUTE_NOMINATIM_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            provider_timeout: duration_var("SAFEROUTE_PROVIDER_TIMEOUT_SECS", 10),
            first_fix_timeout: duration_var("SAFEROUTE_FIX_TIMEOUT_SECS", 5),
            hazard_refresh_interval: duration_var("SAFEROUTE_ALERT_REFRESH_SECS", 60),
            route_cache_max_entries: env::var("SAFEROUTE_ROUTE_CACHE_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64),
            route_cache_max_age: duration_var("SAFEROUTE_ROUTE_CACHE_AGE_SECS", 300),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn duration_var(name: &str, default_secs: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}
