//! Arrival-time estimation against a pacing plan.
//!
//! [`compute_etas`] is a pure function of the split snapshot, the waypoint
//! list, and nothing else; callers re-invoke it with the latest snapshot on
//! every refresh. Waypoints already passed in distance terms are
//! interpolated between the bracketing splits; waypoints still ahead are
//! extrapolated from the recent pace. Any unparseable clock string degrades
//! that one value to "unknown" instead of failing the whole computation.

use model::clock::{format_clock, parse_clock, RACE_START_MINUTES};
use model::{EtaReport, EtaRow, LastSplit, PlanStatus, Split, Waypoint};

/// Plan-delta band: within +/- this many minutes counts as on plan.
const ON_PLAN_BAND_MIN: i64 = 5;

/// Compute ETAs and plan deltas for every waypoint from the given splits.
///
/// Splits may arrive unsorted; they are stably sorted by km, so for
/// duplicate distances the later record in input order is the bracket
/// representative. An empty split set yields all-unknown rows.
pub fn compute_etas(splits: &[Split], waypoints: &[Waypoint]) -> EtaReport {
    let mut sorted: Vec<&Split> = splits.iter().collect();
    sorted.sort_by(|a, b| a.km.0.partial_cmp(&b.km.0).unwrap_or(std::cmp::Ordering::Equal));

    let Some(last) = sorted.last().copied() else {
        return EtaReport {
            last_split: None,
            plan_delta_at_last_split: None,
            etas: unknown_rows(waypoints),
        };
    };

    let last_split = LastSplit {
        km: last.km,
        clock_time: last.clock_time.clone(),
        split_id: last.split_id.clone(),
    };
    let last_min = parse_clock(&last.clock_time);
    if last_min.is_none() {
        // anchor time is unreadable; report the split but no estimates
        return EtaReport {
            last_split: Some(last_split),
            plan_delta_at_last_split: None,
            etas: unknown_rows(waypoints),
        };
    }

    let pace = extrapolation_pace(&sorted, last_min);
    let eta_minutes: Vec<Option<f64>> = waypoints
        .iter()
        .map(|w| eta_minutes_at(w.km.0, &sorted, last, last_min, pace))
        .collect();

    let etas = rows_with_plan_deltas(waypoints, &eta_minutes);
    let plan_delta_at_last_split = last_min
        .zip(plan_target_at_km(last.km.0, waypoints))
        .map(|(actual, target)| (actual - target).round() as i64);

    EtaReport { last_split: Some(last_split), plan_delta_at_last_split, etas }
}

fn unknown_rows(waypoints: &[Waypoint]) -> Vec<EtaRow> {
    waypoints
        .iter()
        .map(|w| EtaRow {
            name: w.name.clone(),
            km: w.km,
            eta: None,
            plan_delta_min: None,
            plan_status: None,
            crew_access: w.crew_access,
        })
        .collect()
}

/// Minutes-per-km pace used for waypoints beyond the last split.
///
/// Preference order: a three-split rolling window (smooths single-segment
/// noise), then the last two splits, then the whole-race average from the
/// 7:00 AM start. Each candidate is skipped when its times fail to parse or
/// its window spans no distance.
fn extrapolation_pace(sorted: &[&Split], last_min: Option<f64>) -> Option<f64> {
    let last = sorted.last()?;
    let last_min = last_min?;

    if sorted.len() >= 3 {
        let window = sorted[sorted.len() - 3];
        if let Some(window_min) = parse_clock(&window.clock_time) {
            let dk = last.km.0 - window.km.0;
            if dk > 0.0 {
                return Some((last_min - window_min) / dk);
            }
        }
    }
    if sorted.len() >= 2 {
        let prev = sorted[sorted.len() - 2];
        if let Some(prev_min) = parse_clock(&prev.clock_time) {
            let dk = last.km.0 - prev.km.0;
            if dk > 0.0 {
                return Some((last_min - prev_min) / dk);
            }
        }
    }
    if last.km.0 > 0.0 {
        return Some((last_min - RACE_START_MINUTES) / last.km.0);
    }
    None
}

/// ETA in minutes-from-midnight at race km `km`, or `None` when any needed
/// time fails to parse.
fn eta_minutes_at(
    km: f64,
    sorted: &[&Split],
    last: &Split,
    last_min: Option<f64>,
    pace: Option<f64>,
) -> Option<f64> {
    if km > last.km.0 {
        // ahead of the runner: extrapolate at recent pace
        return Some(last_min? + pace? * (km - last.km.0));
    }

    let before = sorted.iter().rev().find(|s| s.km.0 <= km);
    let after = sorted.iter().find(|s| s.km.0 > km);
    match (before, after) {
        (_, None) => last_min,
        (None, Some(_)) => {
            // before the very first split: extrapolate backward from it
            let first = sorted.first()?;
            let first_min = parse_clock(&first.clock_time)?;
            if first.km.0 <= 0.0 {
                return None;
            }
            let pace_to_first = (first_min - RACE_START_MINUTES) / first.km.0;
            Some(RACE_START_MINUTES + pace_to_first * km)
        }
        (Some(a), Some(b)) => {
            let a_min = parse_clock(&a.clock_time)?;
            let b_min = parse_clock(&b.clock_time)?;
            let t = (km - a.km.0) / (b.km.0 - a.km.0);
            Some(a_min + t * (b_min - a_min))
        }
    }
}

/// Attach plan deltas and ahead/on/behind bands to the raw ETA estimates.
///
/// The final waypoint's target is shifted by the plan deficit at the
/// second-to-last waypoint, so the finish status reflects the trend of the
/// whole race instead of snapping back from pure geometry.
fn rows_with_plan_deltas(waypoints: &[Waypoint], eta_minutes: &[Option<f64>]) -> Vec<EtaRow> {
    let n = waypoints.len();
    waypoints
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let target_min = w.target.as_deref().and_then(parse_clock);
            let mut adjusted_target = target_min;
            if i + 1 == n && n >= 2 {
                let penultimate_target =
                    waypoints[n - 2].target.as_deref().and_then(parse_clock);
                if let (Some(target), Some(pen_eta), Some(pen_target)) =
                    (target_min, eta_minutes[n - 2], penultimate_target)
                {
                    adjusted_target = Some(target - (pen_eta - pen_target));
                }
            }

            let delta = match (eta_minutes[i], adjusted_target) {
                (Some(eta), Some(target)) => Some((eta - target).round() as i64),
                _ => None,
            };
            EtaRow {
                name: w.name.clone(),
                km: w.km,
                eta: eta_minutes[i].map(format_clock),
                plan_delta_min: delta,
                plan_status: delta.map(band),
                crew_access: w.crew_access,
            }
        })
        .collect()
}

fn band(delta: i64) -> PlanStatus {
    if delta < -ON_PLAN_BAND_MIN {
        PlanStatus::Ahead
    } else if delta > ON_PLAN_BAND_MIN {
        PlanStatus::Behind
    } else {
        PlanStatus::On
    }
}

/// Interpolated plan target (minutes) at race km `km`, bracketing over the
/// waypoints that carry a target. Outside the planned range it extrapolates
/// from the 7:00 AM start (before) or holds the last target (after).
fn plan_target_at_km(km: f64, waypoints: &[Waypoint]) -> Option<f64> {
    let targets: Vec<(f64, f64)> = waypoints
        .iter()
        .filter_map(|w| Some((w.km.0, parse_clock(w.target.as_deref()?)?)))
        .collect();
    if targets.is_empty() {
        return None;
    }

    let before = targets.iter().rev().find(|(wkm, _)| *wkm <= km);
    let after = targets.iter().find(|(wkm, _)| *wkm > km);
    match (before, after) {
        (Some(&(_, min)), None) => Some(min),
        (None, Some(&(bkm, bmin))) => {
            if bkm <= 0.0 {
                return Some(bmin);
            }
            Some(RACE_START_MINUTES + (bmin - RACE_START_MINUTES) / bkm * km)
        }
        (Some(&(akm, amin)), Some(&(bkm, bmin))) => {
            let t = (km - akm) / (bkm - akm);
            Some(amin + t * (bmin - amin))
        }
        (None, None) => None,
    }
}
