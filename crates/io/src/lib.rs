//! Boundary parsers: GPX course files and pacing-plan CSVs.

pub mod gpx;
pub mod plan;

pub use gpx::parse_gpx_track;
pub use plan::{builtin_plan, load_plan_csv, parse_plan_csv, station_markers, StationMarker};
