//! JSON config under the platform config dir
//! (`<config>/crew-tracker/config.json`). A missing file means defaults; a
//! present but unreadable file is an error, not a silent fallback.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use model::RaceTopology;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Poll a saved copy of the official results page.
    Results,
    /// Time-compressed replay of the recorded race.
    Replay,
    /// Fixed demo snapshot.
    Demo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub runner_name: String,
    pub bib: String,
    pub mode: SourceMode,
    /// GPX course recording; the map stays empty without one.
    pub gpx_path: Option<PathBuf>,
    /// Pacing-plan CSV; falls back to the built-in table.
    pub plan_path: Option<PathBuf>,
    /// Saved results page polled in `Results` mode.
    pub results_page_path: Option<PathBuf>,
    pub poll_secs: u64,
    pub refresh_secs: u64,
    pub topology: RaceTopology,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            runner_name: "Aaron Benson".into(),
            bib: "545".into(),
            mode: SourceMode::Demo,
            gpx_path: None,
            plan_path: None,
            results_page_path: None,
            poll_secs: 30,
            refresh_secs: 5,
            topology: RaceTopology::default(),
        }
    }
}

impl TrackerConfig {
    pub fn path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|d| d.join("crew-tracker").join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::path() else {
            anyhow::bail!("no config directory on this platform");
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&path, raw).with_context(|| format!("write config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_the_2026_race() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.bib, "545");
        assert_eq!(cfg.mode, SourceMode::Demo);
        assert_eq!(cfg.topology.race_distance_km, 100.12);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let cfg: TrackerConfig =
            serde_json::from_str(r#"{ "mode": "replay", "bib": "99" }"#).unwrap();
        assert_eq!(cfg.mode, SourceMode::Replay);
        assert_eq!(cfg.bib, "99");
        assert_eq!(cfg.poll_secs, 30);
        assert_eq!(cfg.runner_name, "Aaron Benson");
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut cfg = TrackerConfig::default();
        cfg.gpx_path = Some(PathBuf::from("/tmp/course.gpx"));
        cfg.mode = SourceMode::Results;
        let raw = serde_json::to_string(&cfg).unwrap();
        let back: TrackerConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.gpx_path, cfg.gpx_path);
        assert_eq!(back.mode, SourceMode::Results);
    }
}
