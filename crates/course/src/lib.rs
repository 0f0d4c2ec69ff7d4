//! Course geometry: great-circle distance, annotated-track construction,
//! along-track queries, and race-km <-> track-km mapping for looped courses
//! with an out-and-back prologue.

pub mod geo;
pub mod geometry;
pub mod mapper;
pub mod track;

pub use geometry::{distance_along_track, position_at_distance, segment_points, TrackPosition};
pub use mapper::{
    lap_start_track_km, race_km_to_track_km, race_km_to_track_km_single,
    race_km_to_track_km_three_loops, track_km_to_race_km_for_lap,
};
pub use track::build_track;
