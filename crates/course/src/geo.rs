//! Great-circle distance and bearing between geographic points.

use model::GeoPoint;

/// Earth radius in km for Haversine.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in km between two points.
/// Inputs outside valid lat/lon ranges are garbage-in-garbage-out.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial compass bearing from `a` to `b` in degrees, 0 = North, clockwise.
/// Always in [0, 360). Degenerate (a == b) yields 0.
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let x = d_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let mut bearing = x.atan2(y).to_degrees();
    if bearing < 0.0 {
        bearing += 360.0;
    }
    bearing
}
