//! Along-track queries on an immutable [`Track`]: position and bearing at a
//! distance, nearest along-track distance for a point, and sub-segment
//! extraction between two distances.

use model::{GeoPoint, Track, TrackKm};

use crate::geo;

/// Interpolated position on the track with the segment's constant bearing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    pub lat: f64,
    pub lon: f64,
    pub bearing_deg: f64,
}

impl TrackPosition {
    pub fn geo(&self) -> GeoPoint {
        GeoPoint { lat: self.lat, lon: self.lon }
    }
}

/// Position and bearing at `distance` km along the track.
///
/// Returns `None` only for an empty track. `distance` is clamped to
/// `[0, length]`. A zero-length track (single point or coincident points)
/// yields its first point, with a bearing toward the second point when one
/// exists.
pub fn position_at_distance(track: &Track, distance: TrackKm) -> Option<TrackPosition> {
    let first = track.points.first()?;
    let total = track.length_km;
    if total <= 0.0 {
        let toward = track.points.get(1).unwrap_or(first);
        return Some(TrackPosition {
            lat: first.lat,
            lon: first.lon,
            bearing_deg: geo::bearing_deg(first.geo(), toward.geo()),
        });
    }

    let d = distance.0.clamp(0.0, total);
    for pair in track.points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if d >= a.cumul_km && d <= b.cumul_km {
            let seg = b.cumul_km - a.cumul_km;
            let t = if seg > 0.0 { (d - a.cumul_km) / seg } else { 0.0 };
            return Some(TrackPosition {
                lat: a.lat + t * (b.lat - a.lat),
                lon: a.lon + t * (b.lon - a.lon),
                bearing_deg: geo::bearing_deg(a.geo(), b.geo()),
            });
        }
    }

    // Floating-point slack can push a clamped d past the last bracket.
    let last = track.points.last()?;
    let prev = &track.points[track.points.len() - 2];
    Some(TrackPosition {
        lat: last.lat,
        lon: last.lon,
        bearing_deg: geo::bearing_deg(prev.geo(), last.geo()),
    })
}

/// Along-track distance of the point on the polyline closest to `point`.
///
/// Projects onto every consecutive segment (clamped vector projection) and
/// keeps the candidate with the smallest geographic distance; the final
/// vertex is checked as an explicit candidate. Ties keep the first minimum
/// in scan order from the track start. `None` only for an empty track.
pub fn distance_along_track(track: &Track, point: GeoPoint) -> Option<TrackKm> {
    let first = track.points.first()?;
    if track.points.len() == 1 {
        return Some(TrackKm(first.cumul_km));
    }

    let mut best_km = first.cumul_km;
    let mut best_dist = geo::distance_km(point, first.geo());

    for pair in track.points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let seg_lat = b.lat - a.lat;
        let seg_lon = b.lon - a.lon;
        let d_lat = point.lat - a.lat;
        let d_lon = point.lon - a.lon;
        let seg_len2 = seg_lat * seg_lat + seg_lon * seg_lon;
        let t = if seg_len2 > 0.0 {
            ((d_lat * seg_lat + d_lon * seg_lon) / seg_len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let proj = GeoPoint { lat: a.lat + t * seg_lat, lon: a.lon + t * seg_lon };
        let dist = geo::distance_km(point, proj);
        if dist < best_dist {
            best_dist = dist;
            best_km = a.cumul_km + t * (b.cumul_km - a.cumul_km);
        }
    }

    let last = track.points.last()?;
    if geo::distance_km(point, last.geo()) < best_dist {
        best_km = last.cumul_km;
    }

    Some(TrackKm(best_km))
}

/// Points of the track between `start` and `end` km: the interpolated point
/// at `start`, every original vertex strictly between, and the interpolated
/// point at `end`. Distances are clamped to the track; an empty result means
/// the (clamped) range is empty or the track has no extent.
pub fn segment_points(track: &Track, start: TrackKm, end: TrackKm) -> Vec<GeoPoint> {
    if track.is_empty() || start.0 >= end.0 {
        return Vec::new();
    }
    let total = track.length_km;
    if total <= 0.0 {
        return Vec::new();
    }
    let start_c = start.0.clamp(0.0, total);
    let end_c = end.0.clamp(0.0, total);
    if start_c >= end_c {
        return Vec::new();
    }

    let (start_pos, end_pos) = match (
        position_at_distance(track, TrackKm(start_c)),
        position_at_distance(track, TrackKm(end_c)),
    ) {
        (Some(s), Some(e)) => (s, e),
        _ => return Vec::new(),
    };

    let mut points = vec![start_pos.geo()];
    for v in &track.points {
        if v.cumul_km > start_c && v.cumul_km < end_c {
            points.push(v.geo());
        }
    }
    points.push(end_pos.geo());
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::build_track;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    /// Roughly rectangular loop near the Rocky course, a few km around.
    fn sample_track() -> Track {
        build_track(&[
            pt(30.615, -95.534),
            pt(30.625, -95.534),
            pt(30.625, -95.520),
            pt(30.615, -95.520),
            pt(30.615, -95.534),
        ])
    }

    #[test]
    fn empty_track_yields_none() {
        let track = Track::empty();
        assert!(position_at_distance(&track, TrackKm(1.0)).is_none());
        assert!(distance_along_track(&track, pt(30.0, -95.0)).is_none());
        assert!(segment_points(&track, TrackKm(0.0), TrackKm(1.0)).is_empty());
    }

    #[test]
    fn single_point_track_degenerates_gracefully() {
        let track = build_track(&[pt(30.615, -95.534)]);
        let pos = position_at_distance(&track, TrackKm(5.0)).unwrap();
        assert_eq!((pos.lat, pos.lon), (30.615, -95.534));
        assert_eq!(pos.bearing_deg, 0.0);
        assert_eq!(distance_along_track(&track, pt(31.0, -95.0)), Some(TrackKm(0.0)));
    }

    #[test]
    fn distance_zero_is_the_first_point() {
        let track = sample_track();
        let pos = position_at_distance(&track, TrackKm(0.0)).unwrap();
        assert_eq!((pos.lat, pos.lon), (30.615, -95.534));
    }

    #[test]
    fn distance_clamps_past_the_end() {
        let track = sample_track();
        let pos = position_at_distance(&track, TrackKm(track.length_km + 10.0)).unwrap();
        let last = track.points.last().unwrap();
        assert!((pos.lat - last.lat).abs() < 1e-12);
        assert!((pos.lon - last.lon).abs() < 1e-12);
    }

    #[test]
    fn negative_distance_clamps_to_start() {
        let track = sample_track();
        let pos = position_at_distance(&track, TrackKm(-3.0)).unwrap();
        assert_eq!((pos.lat, pos.lon), (30.615, -95.534));
    }

    #[test]
    fn midpoint_of_first_segment_interpolates_latitude() {
        let track = sample_track();
        let half = track.points[1].cumul_km / 2.0;
        let pos = position_at_distance(&track, TrackKm(half)).unwrap();
        assert!((pos.lat - 30.620).abs() < 1e-6, "got {}", pos.lat);
        assert!((pos.lon - (-95.534)).abs() < 1e-12);
        // first segment heads due north
        assert!((pos.bearing_deg - 0.0).abs() < 1e-6);
    }

    #[test]
    fn projection_round_trips_along_the_track() {
        let track = sample_track();
        let step = track.length_km / 23.0;
        let mut d = 0.0;
        while d <= track.length_km {
            let pos = position_at_distance(&track, TrackKm(d)).unwrap();
            let back = distance_along_track(&track, pos.geo()).unwrap();
            // tolerance of a segment length: straight-line vs curved-earth
            assert!(
                (back.0 - d).abs() < 0.05,
                "round trip at {d} km came back as {} km",
                back.0
            );
            d += step;
        }
    }

    #[test]
    fn projection_prefers_nearest_segment_not_vertex() {
        let track = sample_track();
        // A point just east of the middle of the northern leg projects onto
        // that leg, not onto a corner vertex.
        let probe = pt(30.626, -95.527);
        let km = distance_along_track(&track, probe).unwrap().0;
        let leg_start = track.points[1].cumul_km;
        let leg_end = track.points[2].cumul_km;
        assert!(km > leg_start && km < leg_end, "got {km}");
    }

    #[test]
    fn segment_points_interpolates_both_ends() {
        let track = sample_track();
        let start = 0.3;
        let end = track.length_km - 0.3;
        let seg = segment_points(&track, TrackKm(start), TrackKm(end));
        assert!(seg.len() >= 2);
        let expect_start = position_at_distance(&track, TrackKm(start)).unwrap();
        let expect_end = position_at_distance(&track, TrackKm(end)).unwrap();
        assert_eq!(seg.first().unwrap(), &expect_start.geo());
        assert_eq!(seg.last().unwrap(), &expect_end.geo());
        // interior vertices are originals
        for p in &seg[1..seg.len() - 1] {
            assert!(track.points.iter().any(|v| v.geo() == *p));
        }
    }

    #[test]
    fn segment_points_empty_for_inverted_range() {
        let track = sample_track();
        assert!(segment_points(&track, TrackKm(2.0), TrackKm(1.0)).is_empty());
        assert!(segment_points(&track, TrackKm(1.0), TrackKm(1.0)).is_empty());
    }

    #[test]
    fn segment_points_clamps_out_of_range() {
        let track = sample_track();
        let seg = segment_points(&track, TrackKm(-5.0), TrackKm(track.length_km + 5.0));
        // clamped to the full track: the interpolated ends coincide with the
        // first/last vertices, and every interior vertex is included
        assert_eq!(seg.len(), track.points.len());
        assert_eq!(seg.first().unwrap(), &track.points[0].geo());
        assert_eq!(seg.last().unwrap(), &track.points.last().unwrap().geo());
    }
}
