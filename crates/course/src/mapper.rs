//! Race-km <-> track-km mapping.
//!
//! The recorded polyline covers the main loop exactly once and may exclude
//! the prologue, so the prologue and the loop-closing offset are synthesized
//! here: the marker then moves continuously across lap boundaries instead of
//! jumping when the race distance leaves the recorded data.

use model::{LoopCount, RaceKm, RaceTopology, TrackKm};

/// Map race distance to track distance for the configured topology.
pub fn race_km_to_track_km(race_km: RaceKm, track_length_km: f64, topo: &RaceTopology) -> TrackKm {
    match topo.loops {
        LoopCount::Single => race_km_to_track_km_single(race_km, track_length_km, topo),
        LoopCount::Three => race_km_to_track_km_three_loops(race_km, track_length_km, topo),
    }
}

/// Single-loop course: linear rescale of the raced segment onto the track.
/// Race distance at or below `race_start_km` pins to track km 0; at or past
/// the full distance it pins to the track length.
pub fn race_km_to_track_km_single(
    race_km: RaceKm,
    track_length_km: f64,
    topo: &RaceTopology,
) -> TrackKm {
    let race_km = race_km.0;
    if race_km <= topo.race_start_km {
        return TrackKm(0.0);
    }
    if race_km >= topo.race_distance_km {
        return TrackKm(track_length_km);
    }
    let race_segment = topo.race_distance_km - topo.race_start_km;
    let progress = (race_km - topo.race_start_km) / race_segment;
    TrackKm(progress * track_length_km)
}

/// Three-loop course with an out-and-back prologue spur.
///
/// Regions, in race km: outbound spur `[0, out]` maps 1:1 onto the track
/// start; inbound spur `(out, 2*out]` walks back toward 0; the stretch up to
/// `race_start_km` rejoins the loop; past that, lap 0 starts from the join
/// offset and rescales the remaining track, while laps 1+ scale the whole
/// loop directly.
pub fn race_km_to_track_km_three_loops(
    race_km: RaceKm,
    track_length_km: f64,
    topo: &RaceTopology,
) -> TrackKm {
    let race_km = race_km.0;
    if race_km <= 0.0 {
        return TrackKm(0.0);
    }
    if race_km >= topo.race_distance_km {
        return TrackKm(track_length_km);
    }

    let prologue_out = topo.prologue_out_km;
    let prologue_total = topo.prologue_total_km();
    if race_km <= prologue_out {
        return TrackKm(race_km.min(track_length_km));
    }
    if race_km <= prologue_total {
        return TrackKm((prologue_total - race_km).max(0.0));
    }
    if race_km <= topo.race_start_km {
        return TrackKm((race_km - prologue_total).min(track_length_km));
    }

    let loop_len = topo.loop_length_race_km();
    let into_loops = race_km - topo.race_start_km;
    let lap_index = (into_loops / loop_len).floor() as u32;
    let km_in_lap = into_loops - lap_index as f64 * loop_len;

    if lap_index == 0 {
        // first full lap starts where the prologue joined the loop
        let join = (topo.race_start_km - prologue_total).min(track_length_km);
        return TrackKm(join + (track_length_km - join) * (km_in_lap / loop_len));
    }
    TrackKm(km_in_lap / loop_len * track_length_km)
}

/// Track km at which the runner's current lap began. Used to draw the
/// "covered this lap" segment. Zero for the prologue and for laps 1+; the
/// join offset while the runner is inside lap 0.
pub fn lap_start_track_km(race_km: RaceKm, track_length_km: f64, topo: &RaceTopology) -> TrackKm {
    if topo.loops == LoopCount::Single {
        return TrackKm(0.0);
    }
    let race_km = race_km.0;
    if race_km <= 0.0 || race_km >= topo.race_distance_km {
        return TrackKm(0.0);
    }
    if race_km <= topo.race_start_km {
        return TrackKm(0.0);
    }
    let loop_len = topo.loop_length_race_km();
    let lap_index = ((race_km - topo.race_start_km) / loop_len).floor() as u32;
    if lap_index == 0 {
        return TrackKm((topo.race_start_km - topo.prologue_total_km()).min(track_length_km));
    }
    TrackKm(0.0)
}

/// Inverse of the three-loop lap mapping: race distance for a given track
/// position on a given lap (0-based). Places fixed stations consistently on
/// every lap.
pub fn track_km_to_race_km_for_lap(
    track_km: TrackKm,
    lap_index: u32,
    track_length_km: f64,
    topo: &RaceTopology,
) -> RaceKm {
    let loop_len = topo.loop_length_race_km();
    if lap_index == 0 {
        let join = (topo.race_start_km - topo.prologue_total_km()).min(track_length_km);
        let span = track_length_km - join;
        if span <= 0.0 {
            return RaceKm(topo.race_start_km);
        }
        let km_in_lap = (track_km.0 - join) / span * loop_len;
        return RaceKm(topo.race_start_km + km_in_lap);
    }
    if track_length_km <= 0.0 {
        return RaceKm(topo.race_start_km + lap_index as f64 * loop_len);
    }
    let km_in_lap = track_km.0 / track_length_km * loop_len;
    RaceKm(topo.race_start_km + lap_index as f64 * loop_len + km_in_lap)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK_LEN: f64 = 35.7;

    fn rocky() -> RaceTopology {
        RaceTopology::default()
    }

    fn three(race_km: f64) -> f64 {
        race_km_to_track_km_three_loops(RaceKm(race_km), TRACK_LEN, &rocky()).0
    }

    #[test]
    fn single_loop_midpoint_scales_linearly() {
        let topo = RaceTopology::single_loop(0.0, 100.0);
        let tk = race_km_to_track_km_single(RaceKm(50.0), 50.0, &topo);
        assert_eq!(tk, TrackKm(25.0));
    }

    #[test]
    fn single_loop_clamps_both_ends() {
        let topo = RaceTopology::single_loop(3.5, 100.12);
        assert_eq!(race_km_to_track_km_single(RaceKm(-1.0), TRACK_LEN, &topo), TrackKm(0.0));
        assert_eq!(race_km_to_track_km_single(RaceKm(0.0), TRACK_LEN, &topo), TrackKm(0.0));
        assert_eq!(race_km_to_track_km_single(RaceKm(2.0), TRACK_LEN, &topo), TrackKm(0.0));
        assert_eq!(
            race_km_to_track_km_single(RaceKm(200.0), TRACK_LEN, &topo),
            TrackKm(TRACK_LEN)
        );
    }

    #[test]
    fn outbound_spur_maps_one_to_one() {
        assert!((three(0.5) - 0.5).abs() < 1e-12);
        assert!((three(1.25) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn inbound_spur_walks_back_to_zero() {
        assert!((three(2.0) - 0.5).abs() < 1e-12);
        assert!((three(2.5) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn join_stretch_counts_from_track_start() {
        assert!((three(3.0) - 0.5).abs() < 1e-12);
        assert!((three(3.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lap_zero_starts_at_join_offset_and_ends_at_track_end() {
        let topo = rocky();
        let loop_len = topo.loop_length_race_km();
        let just_in = three(3.5 + 1e-9);
        assert!((just_in - 1.0).abs() < 1e-6, "got {just_in}");
        let near_end = three(3.5 + loop_len - 1e-9);
        assert!((near_end - TRACK_LEN).abs() < 1e-6, "got {near_end}");
    }

    #[test]
    fn later_laps_scale_the_whole_loop() {
        let topo = rocky();
        let loop_len = topo.loop_length_race_km();
        let lap1_start = three(3.5 + loop_len);
        assert!((lap1_start - 0.0).abs() < 1e-9);
        let lap1_mid = three(3.5 + 1.5 * loop_len);
        assert!((lap1_mid - TRACK_LEN / 2.0).abs() < 1e-9);
        let lap2_mid = three(3.5 + 2.5 * loop_len);
        assert!((lap2_mid - TRACK_LEN / 2.0).abs() < 1e-9);
    }

    #[test]
    fn three_loop_clamps_both_ends() {
        assert_eq!(three(0.0), 0.0);
        assert_eq!(three(-2.0), 0.0);
        assert_eq!(three(100.12), TRACK_LEN);
        assert_eq!(three(500.0), TRACK_LEN);
    }

    #[test]
    fn lap_start_is_join_offset_only_within_lap_zero() {
        let topo = rocky();
        let loop_len = topo.loop_length_race_km();
        assert_eq!(lap_start_track_km(RaceKm(1.0), TRACK_LEN, &topo), TrackKm(0.0));
        assert_eq!(lap_start_track_km(RaceKm(3.5), TRACK_LEN, &topo), TrackKm(0.0));
        assert_eq!(lap_start_track_km(RaceKm(10.0), TRACK_LEN, &topo), TrackKm(1.0));
        assert_eq!(
            lap_start_track_km(RaceKm(3.5 + loop_len + 1.0), TRACK_LEN, &topo),
            TrackKm(0.0)
        );
        assert_eq!(lap_start_track_km(RaceKm(0.0), TRACK_LEN, &topo), TrackKm(0.0));
        assert_eq!(lap_start_track_km(RaceKm(100.12), TRACK_LEN, &topo), TrackKm(0.0));
    }

    #[test]
    fn inverse_round_trips_on_every_lap() {
        let topo = rocky();
        let join = topo.race_start_km - topo.prologue_total_km();
        for lap in 0u32..3 {
            // lap 0 only owns track km past the join offset
            let lo = if lap == 0 { join } else { 0.0 };
            let mut tk = lo;
            while tk < TRACK_LEN - 1e-6 {
                let race = track_km_to_race_km_for_lap(TrackKm(tk), lap, TRACK_LEN, &topo);
                let back = race_km_to_track_km_three_loops(race, TRACK_LEN, &topo).0;
                assert!(
                    (back - tk).abs() < 1e-9,
                    "lap {lap}: track {tk} -> race {} -> track {back}",
                    race.0
                );
                tk += 1.7;
            }
        }
    }

    #[test]
    fn inverse_places_stations_in_ascending_race_km() {
        let topo = rocky();
        let gate = TrackKm(6.3);
        let race0 = track_km_to_race_km_for_lap(gate, 0, TRACK_LEN, &topo).0;
        let race1 = track_km_to_race_km_for_lap(gate, 1, TRACK_LEN, &topo).0;
        let race2 = track_km_to_race_km_for_lap(gate, 2, TRACK_LEN, &topo).0;
        assert!(race0 < race1 && race1 < race2);
        assert!(race2 < topo.race_distance_km);
    }
}
