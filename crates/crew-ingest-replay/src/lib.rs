//! Simulation sources: a fixed demo runner and a time-compressed replay of
//! the 2026 race, driven by the official split times. Both exist so the
//! whole pipeline can be exercised without a live race.

use std::time::{Duration, Instant};

use tracing::info;

use crew_ingest_core::{IngestError, ReportOrigin, ReportTx, RunnerReport, SplitSource};
use model::clock::{format_clock, parse_clock, RACE_START_MINUTES};
use model::{RaceTopology, Split};

/// Official 2026 100K split times for the replayed runner.
pub const REPLAY_SPLITS: [(f64, &str); 6] = [
    (12.71, "9:16 AM"),
    (35.41, "11:36 AM"),
    (44.9, "1:51 PM"),
    (67.74, "4:24 PM"),
    (77.25, "6:54 PM"),
    (100.12, "9:44 PM"),
];

pub const REPLAY_TOTAL_TIME: &str = "14:44:19";
pub const REPLAY_RUNNER_NAME: &str = "Aaron Benson";
pub const REPLAY_BIB: &str = "545";

/// Fixed four-split demo snapshot, for when nothing live is available.
pub fn demo_report() -> RunnerReport {
    RunnerReport {
        name: REPLAY_RUNNER_NAME.to_string(),
        bib: "TBD".to_string(),
        splits: vec![
            Split::with_id(12.71, "8:15 AM", "split1"),
            Split::with_id(35.41, "9:50 AM", "split2"),
            Split::with_id(44.9, "11:15 AM", "split3"),
            Split::with_id(67.74, "1:30 PM", "split4"),
        ],
        total_race_time: None,
        origin: ReportOrigin::Demo,
    }
}

/// Clock time (minutes from midnight) at `km`, interpolated over the
/// replayed splits. Before the first split the time scales from the 7:00 AM
/// start; past the last split it holds the final time.
pub fn interpolate_clock_at_km(km: f64, splits: &[(f64, &str)]) -> f64 {
    let Some(&(first_km, first_time)) = splits.first() else {
        return RACE_START_MINUTES;
    };
    if km <= first_km {
        let Some(first_min) = parse_clock(first_time) else {
            return RACE_START_MINUTES;
        };
        let t = if first_km > 0.0 { km / first_km } else { 1.0 };
        return RACE_START_MINUTES + t * (first_min - RACE_START_MINUTES);
    }
    for pair in splits.windows(2) {
        let (a_km, a_time) = pair[0];
        let (b_km, b_time) = pair[1];
        if km >= a_km && km <= b_km {
            let (Some(a_min), Some(b_min)) = (parse_clock(a_time), parse_clock(b_time)) else {
                return RACE_START_MINUTES;
            };
            let t = (km - a_km) / (b_km - a_km);
            return a_min + t * (b_min - a_min);
        }
    }
    splits
        .last()
        .and_then(|&(_, t)| parse_clock(t))
        .unwrap_or(RACE_START_MINUTES)
}

/// Resends the fixed demo snapshot on an interval.
pub struct DemoSource {
    pub resend: Duration,
}

#[async_trait::async_trait]
impl SplitSource for DemoSource {
    async fn run(&self, tx: ReportTx) -> Result<(), IngestError> {
        let mut ticker = tokio::time::interval(self.resend);
        loop {
            ticker.tick().await;
            let _ = tx.send(demo_report());
        }
    }
}

/// Replays the whole recorded race compressed into `duration`, emitting a
/// snapshot of passed splits plus the runner's interpolated current
/// position every `tick`. Completes once the simulated runner finishes.
pub struct ReplaySource {
    pub duration: Duration,
    pub tick: Duration,
    pub race_distance_km: f64,
}

impl Default for ReplaySource {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(90),
            tick: Duration::from_millis(100),
            race_distance_km: RaceTopology::DEFAULT_RACE_DISTANCE_KM,
        }
    }
}

impl ReplaySource {
    /// The snapshot for a simulated position `km` along the race.
    fn report_at(&self, km: f64, finished: bool) -> RunnerReport {
        let mut splits: Vec<Split> = REPLAY_SPLITS
            .iter()
            .take_while(|&&(split_km, _)| split_km <= km)
            .enumerate()
            .map(|(i, &(split_km, time))| Split::with_id(split_km, time, format!("split{}", i + 1)))
            .collect();
        if !finished && splits.last().map(|s| s.km.0 < km).unwrap_or(true) {
            let clock = format_clock(interpolate_clock_at_km(km, &REPLAY_SPLITS));
            splits.push(Split::new(km, clock));
        }
        RunnerReport {
            name: REPLAY_RUNNER_NAME.to_string(),
            bib: REPLAY_BIB.to_string(),
            splits,
            total_race_time: finished.then(|| REPLAY_TOTAL_TIME.to_string()),
            origin: ReportOrigin::Replay,
        }
    }
}

#[async_trait::async_trait]
impl SplitSource for ReplaySource {
    async fn run(&self, tx: ReportTx) -> Result<(), IngestError> {
        info!(duration_s = self.duration.as_secs(), "replay started");
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.tick);
        loop {
            ticker.tick().await;
            let progress =
                (started.elapsed().as_secs_f64() / self.duration.as_secs_f64()).min(1.0);
            let km = progress * self.race_distance_km;
            let finished = progress >= 1.0;
            let _ = tx.send(self.report_at(km, finished));
            if finished {
                info!("replay finished");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_scales_from_the_start_before_the_first_split() {
        // start 7:00, first split 9:16 at 12.71 km; halfway in distance is
        // halfway in time
        let mid = interpolate_clock_at_km(12.71 / 2.0, &REPLAY_SPLITS);
        assert!((mid - (420.0 + 136.0 / 2.0)).abs() < 1e-9);
        assert_eq!(interpolate_clock_at_km(0.0, &REPLAY_SPLITS), RACE_START_MINUTES);
    }

    #[test]
    fn interpolation_brackets_between_splits() {
        // 9:16 (556) at 12.71 and 11:36 (696) at 35.41
        let km = (12.71 + 35.41) / 2.0;
        let min = interpolate_clock_at_km(km, &REPLAY_SPLITS);
        assert!((min - 626.0).abs() < 1e-9);
    }

    #[test]
    fn interpolation_holds_past_the_finish() {
        let min = interpolate_clock_at_km(150.0, &REPLAY_SPLITS);
        // 9:44 PM
        assert_eq!(min, 21.0 * 60.0 + 44.0);
    }

    #[test]
    fn empty_split_list_falls_back_to_the_start() {
        assert_eq!(interpolate_clock_at_km(50.0, &[]), RACE_START_MINUTES);
    }

    #[test]
    fn report_midrace_has_passed_splits_plus_current_position() {
        let source = ReplaySource::default();
        let report = source.report_at(40.0, false);
        assert_eq!(report.origin, ReportOrigin::Replay);
        assert!(report.total_race_time.is_none());
        // splits 1 and 2 passed, then the synthetic current position
        assert_eq!(report.splits.len(), 3);
        assert_eq!(report.splits[0].split_id.as_deref(), Some("split1"));
        assert_eq!(report.splits[1].split_id.as_deref(), Some("split2"));
        let current = &report.splits[2];
        assert!(current.split_id.is_none());
        assert_eq!(current.km.0, 40.0);
        assert!(parse_clock(&current.clock_time).is_some());
    }

    #[test]
    fn report_at_finish_has_all_official_splits_and_total_time() {
        let source = ReplaySource::default();
        let report = source.report_at(source.race_distance_km, true);
        assert_eq!(report.splits.len(), 6);
        assert!(report.splits.iter().all(|s| s.split_id.is_some()));
        assert_eq!(report.total_race_time.as_deref(), Some(REPLAY_TOTAL_TIME));
    }

    #[test]
    fn demo_report_matches_the_fixed_snapshot() {
        let report = demo_report();
        assert_eq!(report.origin, ReportOrigin::Demo);
        assert_eq!(report.splits.len(), 4);
        assert_eq!(report.splits[3].clock_time, "1:30 PM");
    }
}
