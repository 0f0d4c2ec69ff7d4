//! Builds an annotated [`Track`] from an ordered point sequence.

use model::{Bounds, GeoPoint, Track, TrackVertex};

use crate::geo;

/// Annotate an ordered point sequence with cumulative along-track distance.
///
/// The first vertex gets `cumul_km = 0`; every following vertex adds the
/// Haversine distance from its predecessor. An empty input yields an empty
/// track of length 0 with no bounds.
pub fn build_track(points: &[GeoPoint]) -> Track {
    if points.is_empty() {
        return Track::empty();
    }

    let mut vertices = Vec::with_capacity(points.len());
    let mut cumul = 0.0;
    vertices.push(TrackVertex { lat: points[0].lat, lon: points[0].lon, cumul_km: 0.0 });
    for pair in points.windows(2) {
        cumul += geo::distance_km(pair[0], pair[1]);
        vertices.push(TrackVertex { lat: pair[1].lat, lon: pair[1].lon, cumul_km: cumul });
    }

    let bounds = bounds_of(points);
    Track { points: vertices, length_km: cumul, bounds: Some(bounds) }
}

fn bounds_of(points: &[GeoPoint]) -> Bounds {
    let mut b = Bounds {
        min_lat: f64::INFINITY,
        min_lon: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        max_lon: f64::NEG_INFINITY,
    };
    for p in points {
        if p.lat < b.min_lat {
            b.min_lat = p.lat;
        }
        if p.lat > b.max_lat {
            b.max_lat = p.lat;
        }
        if p.lon < b.min_lon {
            b.min_lon = p.lon;
        }
        if p.lon > b.max_lon {
            b.max_lon = p.lon;
        }
    }
    b
}
