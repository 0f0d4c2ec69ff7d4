//! Pacing-plan CSV import.
//!
//! The plan is a spreadsheet export with one row per aid-station visit, in
//! race order: `station,km,mile,target_time,early_time,late_time,notes`.
//! Placeholder dashes stand for "no time planned". Crew access is not a
//! column; it is derived from the station name and notes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use model::{RaceKm, Waypoint};

#[derive(Debug, Deserialize)]
struct PlanRow {
    #[serde(default)]
    station: String,
    #[serde(default)]
    km: String,
    #[serde(default)]
    #[allow(dead_code)]
    mile: String,
    #[serde(default)]
    target_time: String,
    #[serde(default)]
    early_time: String,
    #[serde(default)]
    late_time: String,
    #[serde(default)]
    notes: String,
}

/// Load and parse a pacing-plan CSV file.
pub fn load_plan_csv(path: &Path) -> Result<Vec<Waypoint>> {
    let file = File::open(path).with_context(|| format!("open plan {}", path.display()))?;
    parse_plan_csv(file)
}

/// Parse pacing-plan CSV from any reader. Rows without a station name are
/// skipped; a plan with no usable rows is an error so the caller can fall
/// back to the built-in table.
pub fn parse_plan_csv(reader: impl Read) -> Result<Vec<Waypoint>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut waypoints = Vec::new();
    for record in rdr.deserialize() {
        let row: PlanRow = record.context("read plan row")?;
        if row.station.is_empty() {
            continue;
        }
        waypoints.push(Waypoint {
            crew_access: is_crew_access(&row.station, &row.notes),
            name: row.station,
            km: RaceKm(row.km.parse().unwrap_or(0.0)),
            target: plan_time(&row.target_time),
            early: plan_time(&row.early_time),
            late: plan_time(&row.late_time),
        });
    }
    if waypoints.is_empty() {
        bail!("pacing plan has no stations");
    }
    Ok(waypoints)
}

fn plan_time(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() || t == "—" || t == "-" {
        None
    } else {
        Some(t.to_string())
    }
}

/// Crew can meet the runner at Tyler's Corner (start/finish area) and where
/// the notes call out a crew stop or the Zach pickup.
fn is_crew_access(station: &str, notes: &str) -> bool {
    let s = station.to_lowercase();
    let n = notes.to_lowercase();
    s.contains("tyler's")
        || s.contains("tylers")
        || s.contains("finish")
        || n.contains("crew")
        || n.contains("zach")
}

/// A named aid station placed once on the recorded loop; rendered at its
/// per-lap race distances via the inverse lap mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMarker {
    pub name: String,
    pub km: RaceKm,
}

/// Derive one marker per on-course aid station from the first lap's rows.
///
/// Station names repeat each lap (and may carry a parenthetical like
/// "(Zach)"), so this keeps the first occurrence of each base name and
/// skips the Tyler's start/finish compound.
pub fn station_markers(waypoints: &[Waypoint]) -> Vec<StationMarker> {
    let mut seen = Vec::new();
    let mut markers = Vec::new();
    for w in waypoints {
        let base = base_name(&w.name);
        if base.contains("Tyler's") || base.eq_ignore_ascii_case("finish") || base.eq_ignore_ascii_case("start") {
            continue;
        }
        if seen.iter().any(|s| s == &base) {
            continue;
        }
        seen.push(base.clone());
        markers.push(StationMarker { name: base, km: w.km });
    }
    markers
}

fn base_name(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.rfind('(') {
        Some(i) if trimmed.ends_with(')') => trimmed[..i].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Built-in station table from the crew guide, used when no CSV is
/// available. Distances in km, times for the 7:00 AM start.
pub fn builtin_plan() -> Vec<Waypoint> {
    fn wp(
        name: &str,
        km: f64,
        target: Option<&str>,
        early: Option<&str>,
        late: Option<&str>,
        crew_access: bool,
    ) -> Waypoint {
        Waypoint {
            name: name.to_string(),
            km: RaceKm(km),
            target: target.map(str::to_string),
            early: early.map(str::to_string),
            late: late.map(str::to_string),
            crew_access,
        }
    }

    vec![
        wp("START — Tyler's", 0.0, Some("7:00 AM"), None, None, true),
        wp("Tyler's (Prologue done)", 3.54, Some("7:16 AM"), Some("7:12 AM"), Some("7:20 AM"), true),
        wp("Gate", 9.66, Some("7:44 AM"), Some("7:38 AM"), Some("7:55 AM"), false),
        wp("Nature Center", 18.19, Some("8:23 AM"), Some("8:13 AM"), Some("8:40 AM"), false),
        wp("Dam Nation", 26.23, Some("9:00 AM"), Some("8:47 AM"), Some("9:22 AM"), false),
        wp("Tyler's (Lap 1 done)", 35.73, Some("9:55 AM"), Some("9:35 AM"), Some("10:30 AM"), true),
        wp("Gate", 41.84, Some("10:28 AM"), Some("10:05 AM"), Some("11:08 AM"), false),
        wp("Nature Center", 50.38, Some("11:12 AM"), Some("10:45 AM"), Some("12:00 PM"), false),
        wp("Dam Nation", 58.42, Some("11:55 AM"), Some("11:22 AM"), Some("12:50 PM"), false),
        wp("Tyler's (Lap 2 done)", 67.9, Some("1:45 PM"), Some("1:00 PM"), Some("2:30 PM"), true),
        wp("Gate", 74.03, Some("2:40 PM"), Some("1:50 PM"), Some("3:45 PM"), false),
        wp("Nature Center", 82.43, Some("4:00 PM"), Some("2:50 PM"), Some("5:30 PM"), false),
        wp("Dam Nation", 90.47, Some("5:20 PM"), Some("4:00 PM"), Some("7:00 PM"), false),
        wp("FINISH — Tyler's", 99.94, Some("9:00 PM"), Some("8:00 PM"), Some("10:00 PM"), true),
    ]
}
