mod config;
mod session;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use course::{
    build_track, lap_start_track_km, position_at_distance, race_km_to_track_km, segment_points,
    track_km_to_race_km_for_lap,
};
use crew_ingest_checkin::{CheckinSource, CheckinStore};
use crew_ingest_core::RunnerReport;
use crew_ingest_replay::{DemoSource, ReplaySource};
use crew_ingest_results::ResultsFileSource;
use eta::compute_etas;
use iox::{builtin_plan, load_plan_csv, parse_gpx_track, station_markers};
use model::{EtaReport, LoopCount, PlanStatus, RaceKm, Track, Waypoint};

use config::{SourceMode, TrackerConfig};
use session::{run_source, TrackerSession};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = TrackerConfig::load()?;
    info!(runner = %cfg.runner_name, bib = %cfg.bib, mode = ?cfg.mode, "tracker starting");

    let track = load_track(&cfg);
    let plan = load_plan(&cfg);
    print_station_markers(&plan, &track, &cfg);

    let sess = Arc::new(TrackerSession::new());
    let store = Arc::new(CheckinStore::new());
    store.set_default_bib(&cfg.bib);
    spawn_sources(&cfg, &sess, &store)?;

    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.refresh_secs.max(1)));
    loop {
        ticker.tick().await;
        let merged = sess.inner.lock().merged();
        match merged {
            Some(report) => {
                let etas = compute_etas(&report.splits, &plan);
                render(&report, &etas, &track, &cfg);
            }
            None => info!("waiting for the first report"),
        }
    }
}

fn load_track(cfg: &TrackerConfig) -> Track {
    let Some(path) = &cfg.gpx_path else {
        warn!("no GPX course configured; map output disabled");
        return Track::empty();
    };
    match fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|xml| parse_gpx_track(&xml))
    {
        Ok(points) => {
            let track = build_track(&points);
            info!(points = track.points.len(), length_km = track.length_km, "course loaded");
            track
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "course unreadable; map output disabled");
            Track::empty()
        }
    }
}

fn load_plan(cfg: &TrackerConfig) -> Vec<Waypoint> {
    if let Some(path) = &cfg.plan_path {
        match load_plan_csv(path) {
            Ok(plan) => {
                info!(stations = plan.len(), "pacing plan loaded");
                return plan;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "plan unreadable; using built-in"),
        }
    }
    builtin_plan()
}

fn spawn_sources(
    cfg: &TrackerConfig,
    sess: &Arc<TrackerSession>,
    store: &Arc<CheckinStore>,
) -> Result<()> {
    let poll = Duration::from_secs(cfg.poll_secs.max(1));
    match cfg.mode {
        SourceMode::Results => {
            let path = cfg
                .results_page_path
                .clone()
                .context("results mode needs results_page_path in the config")?;
            run_source(
                ResultsFileSource { path, bib: cfg.bib.clone(), poll },
                Arc::clone(sess),
            );
        }
        SourceMode::Replay => {
            run_source(
                ReplaySource {
                    race_distance_km: cfg.topology.race_distance_km,
                    ..ReplaySource::default()
                },
                Arc::clone(sess),
            );
        }
        SourceMode::Demo => {
            run_source(DemoSource { resend: poll }, Arc::clone(sess));
        }
    }
    run_source(
        CheckinSource {
            store: Arc::clone(store),
            bib: cfg.bib.clone(),
            runner_name: cfg.runner_name.clone(),
            poll,
        },
        Arc::clone(sess),
    );
    Ok(())
}

/// Stations sit at fixed track positions but several race distances; list
/// each marker with its per-lap race km so the crew can relate the two.
fn print_station_markers(plan: &[Waypoint], track: &Track, cfg: &TrackerConfig) {
    if track.is_empty() || cfg.topology.loops != LoopCount::Three {
        return;
    }
    println!("course stations:");
    for marker in station_markers(plan) {
        let track_km = race_km_to_track_km(marker.km, track.length_km, &cfg.topology);
        let laps: Vec<String> = (0..3)
            .map(|lap| {
                let race = track_km_to_race_km_for_lap(track_km, lap, track.length_km, &cfg.topology);
                format!("{:.1}", race.0)
            })
            .collect();
        println!("  {:<16} track km {:>5.1}  race km {}", marker.name, track_km.0, laps.join(" / "));
    }
}

fn render(report: &RunnerReport, etas: &EtaReport, track: &Track, cfg: &TrackerConfig) {
    println!();
    println!("== {} (bib {}) ==", report.name, report.bib);

    if let Some(last) = &etas.last_split {
        match etas.plan_delta_at_last_split {
            Some(delta) => println!(
                "last split: {:.2} km at {} ({} vs plan)",
                last.km.0,
                last.clock_time,
                signed_minutes(delta)
            ),
            None => println!("last split: {:.2} km at {}", last.km.0, last.clock_time),
        }
        print_position(last.km, track, cfg);
    } else {
        println!("no splits yet");
    }

    for row in &etas.etas {
        let eta = row.eta.as_deref().unwrap_or("--");
        let delta = row.plan_delta_min.map(signed_minutes).unwrap_or_default();
        let status = match row.plan_status {
            Some(PlanStatus::Ahead) => "ahead",
            Some(PlanStatus::On) => "on",
            Some(PlanStatus::Behind) => "behind",
            None => "",
        };
        let crew = if row.crew_access { "[crew]" } else { "" };
        println!(
            "  {:<26} {:>6.2} km  {:>8}  {:>4} {:<6} {}",
            row.name, row.km.0, eta, delta, status, crew
        );
    }

    if let Some(total) = &report.total_race_time {
        println!("finished in {total}");
    }
}

fn print_position(race_km: RaceKm, track: &Track, cfg: &TrackerConfig) {
    if track.is_empty() {
        return;
    }
    let track_km = race_km_to_track_km(race_km, track.length_km, &cfg.topology);
    let Some(pos) = position_at_distance(track, track_km) else {
        return;
    };
    let lap_start = lap_start_track_km(race_km, track.length_km, &cfg.topology);
    let covered = segment_points(track, lap_start, track_km);
    println!(
        "position: {:.5}, {:.5}  heading {:.0}\u{b0}  (track km {:.1}, {:.1} km into this lap, {} trace points)",
        pos.lat,
        pos.lon,
        pos.bearing_deg,
        track_km.0,
        (track_km.0 - lap_start.0).max(0.0),
        covered.len()
    );
}

fn signed_minutes(delta: i64) -> String {
    format!("{delta:+} min")
}
