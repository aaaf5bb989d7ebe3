//! Core data models for route planning and navigation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo;

/// A WGS84 position. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Latitude/longitude outside the valid WGS84 ranges.
///
/// Rejected at the acquisition boundary so NaN never reaches the
/// geospatial math or the safety score.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("coordinate out of range: lat {lat}, lng {lng}")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinate> {
        let candidate = Self { lat, lng };
        candidate.validate()?;
        Ok(candidate)
    }

    /// Check this coordinate against the valid WGS84 ranges.
    pub fn validate(&self) -> Result<(), InvalidCoordinate> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Category of a reported hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardCategory {
    Terrorism,
    Protest,
    Theft,
    Accident,
    Other,
}

/// Severity of a reported hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardSeverity {
    Low,
    Medium,
    High,
}

impl HazardSeverity {
    /// Display radius of the risk zone around the hazard, in meters.
    pub fn radius_m(self) -> f64 {
        match self {
            Self::High => 5000.0,
            _ => 3000.0,
        }
    }
}

/// A location-tagged safety event from the alerts source.
///
/// Owned by the external alerts feed; the engine only reads
/// point-in-time snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub coordinate: Coordinate,
    pub category: HazardCategory,
    pub severity: HazardSeverity,
    pub description: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// One maneuver along a route, anchored at the point where it begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInstruction {
    pub text: String,
    pub coordinate: Coordinate,
    pub distance_m: f64,
    pub time_s: f64,
}

/// Route geometry with fewer than two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("route geometry must contain at least two points")]
pub struct DegenerateGeometry;

/// A planned route. Immutable once constructed; a new plan replaces the
/// old route wholesale rather than patching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Polyline in travel order, at least two points.
    pub geometry: Vec<Coordinate>,
    /// Maneuvers in travel order.
    pub instructions: Vec<RouteInstruction>,
    pub total_distance_m: f64,
    pub total_time_s: f64,
    /// True when the routing provider was unavailable and the geometry
    /// is the straight line between origin and destination.
    pub is_fallback: bool,
}

pub const FALLBACK_INSTRUCTION: &str = "Proceed to destination";

impl Route {
    /// Normalize a provider result into a route.
    ///
    /// When the provider reports no totals, they are recomputed from the
    /// geometry (distance) and the instruction list (time).
    pub fn from_provider(
        geometry: Vec<Coordinate>,
        instructions: Vec<RouteInstruction>,
        total_distance_m: f64,
        total_time_s: f64,
    ) -> Result<Self, DegenerateGeometry> {
        if geometry.len() < 2 {
            return Err(DegenerateGeometry);
        }

        let total_distance_m = if total_distance_m > 0.0 {
            total_distance_m
        } else {
            geo::polyline_length_m(&geometry)
        };
        let total_time_s = if total_time_s > 0.0 {
            total_time_s
        } else {
            instructions.iter().map(|i| i.time_s).sum()
        };

        Ok(Self {
            geometry,
            instructions,
            total_distance_m,
            total_time_s,
            is_fallback: false,
        })
    }

    /// Degraded straight-line route used when the provider cannot be
    /// reached. Always valid: two geometry points and one synthetic
    /// instruction, timed at the fixed average speed.
    pub fn fallback(origin: Coordinate, destination: Coordinate) -> Self {
        let distance_km = geo::distance_km(origin, destination);
        let distance_m = distance_km * 1000.0;
        let time_s = geo::estimate_travel_minutes(distance_km) as f64 * 60.0;

        Self {
            geometry: vec![origin, destination],
            instructions: vec![RouteInstruction {
                text: FALLBACK_INSTRUCTION.to_string(),
                coordinate: origin,
                distance_m,
                time_s,
            }],
            total_distance_m: distance_m,
            total_time_s: time_s,
            is_fallback: true,
        }
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_m / 1000.0
    }
}

/// A single device location report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    pub timestamp: DateTime<Utc>,
}
