use serde::{Deserialize, Serialize};

pub mod clock;

/// Cumulative event distance in km (prologue + all laps).
///
/// Kept distinct from [`TrackKm`] so the two coordinate systems can never be
/// mixed by accident: the recorded GPS polyline covers one loop and may
/// exclude the prologue, so the same physical spot has several race-km values.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceKm(pub f64);

/// Distance in km along the recorded track polyline.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackKm(pub f64);

/// Raw geographic coordinate from the track source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Track point annotated with cumulative along-track distance.
/// `cumul_km` is non-decreasing over the sequence and 0 at the first point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackVertex {
    pub lat: f64,
    pub lon: f64,
    pub cumul_km: f64,
}

impl TrackVertex {
    pub fn geo(&self) -> GeoPoint {
        GeoPoint { lat: self.lat, lon: self.lon }
    }
}

/// Lat/lon bounding rectangle over a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Annotated polyline built once per course file and replaced wholesale on
/// reload. An empty track is valid; geometry queries then return `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub points: Vec<TrackVertex>,
    pub length_km: f64,
    pub bounds: Option<Bounds>,
}

impl Track {
    pub fn empty() -> Self {
        Self { points: Vec::new(), length_km: 0.0, bounds: None }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn length(&self) -> TrackKm {
        TrackKm(self.length_km)
    }
}

/// How many times the recorded loop is repeated over the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopCount {
    Single,
    Three,
}

/// Parameters relating race distance to the recorded track.
///
/// `race_start_km` is the race distance at which the track's km-0 point
/// aligns (3.5 when the prologue is missing from the recording).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceTopology {
    pub race_start_km: f64,
    pub race_distance_km: f64,
    pub loops: LoopCount,
    pub prologue_out_km: f64,
}

impl RaceTopology {
    pub const DEFAULT_RACE_START_KM: f64 = 3.5;
    pub const DEFAULT_RACE_DISTANCE_KM: f64 = 100.12;
    pub const DEFAULT_PROLOGUE_OUT_KM: f64 = 1.25;

    pub fn three_loop(race_start_km: f64, race_distance_km: f64) -> Self {
        Self {
            race_start_km,
            race_distance_km,
            loops: LoopCount::Three,
            prologue_out_km: Self::DEFAULT_PROLOGUE_OUT_KM,
        }
    }

    pub fn single_loop(race_start_km: f64, race_distance_km: f64) -> Self {
        Self {
            race_start_km,
            race_distance_km,
            loops: LoopCount::Single,
            prologue_out_km: 0.0,
        }
    }

    /// Out-and-back spur length (out + back).
    pub fn prologue_total_km(&self) -> f64 {
        self.prologue_out_km * 2.0
    }

    /// Per-loop race distance.
    pub fn loop_length_race_km(&self) -> f64 {
        match self.loops {
            LoopCount::Single => self.race_distance_km,
            LoopCount::Three => self.race_distance_km / 3.0,
        }
    }
}

impl Default for RaceTopology {
    fn default() -> Self {
        Self::three_loop(Self::DEFAULT_RACE_START_KM, Self::DEFAULT_RACE_DISTANCE_KM)
    }
}

/// One observed (distance, time-of-day) pair for the tracked runner.
/// Clock times are 12-hour strings like "9:15 AM"; parse failures degrade to
/// unknown outputs downstream rather than erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub km: RaceKm,
    pub clock_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_id: Option<String>,
}

impl Split {
    pub fn new(km: f64, clock_time: impl Into<String>) -> Self {
        Self { km: RaceKm(km), clock_time: clock_time.into(), split_id: None }
    }

    pub fn with_id(km: f64, clock_time: impl Into<String>, id: impl Into<String>) -> Self {
        Self { km: RaceKm(km), clock_time: clock_time.into(), split_id: Some(id.into()) }
    }
}

/// Aid station / pacing-plan entry, ordered by km for a whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub km: RaceKm,
    /// Planned arrival time-of-day; `None` when the plan has no target here.
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late: Option<String>,
    pub crew_access: bool,
}

/// Signed relation of an ETA to the plan target, banded at +/-5 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Ahead,
    On,
    Behind,
}

/// Per-waypoint arrival estimate. Recomputed fresh on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaRow {
    pub name: String,
    pub km: RaceKm,
    /// Clock-time string, or `None` when the estimate is unknown.
    pub eta: Option<String>,
    pub plan_delta_min: Option<i64>,
    pub plan_status: Option<PlanStatus>,
    pub crew_access: bool,
}

/// The most recent observation the estimates were anchored on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastSplit {
    pub km: RaceKm,
    pub clock_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_id: Option<String>,
}

/// Full output of one ETA computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaReport {
    pub last_split: Option<LastSplit>,
    /// Minutes relative to plan at the runner's last known position;
    /// positive means later than planned.
    pub plan_delta_at_last_split: Option<i64>,
    pub etas: Vec<EtaRow>,
}
