//! Geospatial math for distance and travel-time estimation.

use crate::models::Coordinate;

/// Mean Earth radius in kilometers, matching the routing layer's convention.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average driving speed when no provider timing is available.
pub const AVERAGE_SPEED_KMH: f64 = 50.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Uses the Haversine formula. Symmetric, and zero (within float
/// tolerance) when both points coincide. Callers must validate
/// latitude/longitude ranges before calling; out-of-range input
/// produces meaningless results rather than an error.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Estimated travel time in whole minutes at the fixed average speed.
///
/// Fallback only: used when the routing provider supplied no timing.
pub fn estimate_travel_minutes(distance_km: f64) -> i64 {
    (distance_km / AVERAGE_SPEED_KMH * 60.0).round() as i64
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360).
/// 0 = north, 90 = east.
pub fn bearing_deg(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let x = dlambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Total length of a polyline in meters, summed over consecutive
/// great-circle segments.
pub fn polyline_length_m(geometry: &[Coordinate]) -> f64 {
    geometry
        .windows(2)
        .map(|pair| distance_km(pair[0], pair[1]) * 1000.0)
        .sum()
}
