//! Official timing-results source.
//!
//! The timing provider publishes a per-runner detail page as an HTML table
//! of label/value rows. Lap chip times are elapsed "HH:MM:SS" from the gun;
//! they are converted to clock times against the 7:00 AM start and paired
//! with the official 100K split distances. A polling file source re-parses
//! a saved copy of that page, so the tracker works from whatever snapshot
//! the crew can get onto disk.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crew_ingest_core::{IngestError, ReportOrigin, ReportTx, RunnerReport, SplitSource};
use model::clock::{format_clock, parse_elapsed, RACE_START_MINUTES};
use model::Split;

/// Official 100K timing split locations, km from the start.
pub const SPLITS_100K_KM: [(&str, f64); 6] = [
    ("split1", 12.71),
    ("split2", 35.41),
    ("split3", 44.9),
    ("split4", 67.74),
    ("split5", 77.25),
    ("split6", 100.12),
];

/// Parse a runner detail page into a report, or `None` when the page holds
/// no completed lap yet.
///
/// Only `Lap N Chip Time` rows count; gun times and "Active" placeholders
/// are ignored. The runner name and `Total Race Time` are taken from their
/// label rows when present.
pub fn parse_runner_page(html: &str, bib: &str) -> Option<RunnerReport> {
    let mut name = String::from("Runner");
    let mut total_race_time = None;
    let mut lap_times: [Option<String>; 6] = Default::default();

    for row in table_rows(html) {
        let cells = row_cells(&row);
        if cells.len() < 2 {
            continue;
        }
        let label = cells[0].trim();
        let value = cells[1].trim();

        if label == "Name" && !value.is_empty() {
            name = value.to_string();
        }
        if label == "Total Race Time" && parse_elapsed(value).is_some() {
            total_race_time = Some(value.to_string());
        }
        if let Some(lap) = chip_time_lap(label) {
            if let Some(elapsed_min) = parse_elapsed(value) {
                lap_times[lap - 1] = Some(format_clock(RACE_START_MINUTES + elapsed_min));
            }
        }
    }

    let splits: Vec<Split> = SPLITS_100K_KM
        .iter()
        .zip(lap_times.iter())
        .filter_map(|(&(id, km), time)| {
            time.as_ref().map(|t| Split::with_id(km, t.clone(), id))
        })
        .collect();

    if splits.is_empty() {
        return None;
    }
    Some(RunnerReport {
        name,
        bib: bib.to_string(),
        splits,
        total_race_time,
        origin: ReportOrigin::Results,
    })
}

/// Lap number for a `Lap N Chip Time` label, N in 1..=6.
fn chip_time_lap(label: &str) -> Option<usize> {
    let rest = label.strip_prefix("Lap ")?;
    let (num, tail) = rest.split_once(' ')?;
    if !tail.eq_ignore_ascii_case("Chip Time") {
        return None;
    }
    let lap: usize = num.parse().ok()?;
    (1..=6).contains(&lap).then_some(lap)
}

/// The `<tr>...</tr>` blocks of the page, inner HTML only.
///
/// Tag matching is case-insensitive via ASCII lowercasing, which keeps byte
/// offsets aligned with the original text even when cell content is
/// non-ASCII.
fn table_rows(html: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut rows = Vec::new();
    let mut at = 0;
    while let Some(open) = lower[at..].find("<tr") {
        let open = at + open;
        let Some(open_end) = lower[open..].find('>') else { break };
        let body_start = open + open_end + 1;
        let Some(close) = lower[body_start..].find("</tr") else { break };
        rows.push(html[body_start..body_start + close].to_string());
        at = body_start + close + 4;
    }
    rows
}

/// Text content of each `<td>` in a row, tags stripped.
fn row_cells(row: &str) -> Vec<String> {
    let lower = row.to_ascii_lowercase();
    let mut cells = Vec::new();
    let mut at = 0;
    while let Some(open) = lower[at..].find("<td") {
        let open = at + open;
        let Some(open_end) = lower[open..].find('>') else { break };
        let body_start = open + open_end + 1;
        let Some(close) = lower[body_start..].find("</td") else { break };
        cells.push(strip_tags(&row[body_start..body_start + close]));
        at = body_start + close + 4;
    }
    cells
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Polls a saved runner page on disk and resends the parsed report.
pub struct ResultsFileSource {
    pub path: PathBuf,
    pub bib: String,
    pub poll: Duration,
}

#[async_trait::async_trait]
impl SplitSource for ResultsFileSource {
    async fn run(&self, tx: ReportTx) -> Result<(), IngestError> {
        let mut ticker = tokio::time::interval(self.poll);
        loop {
            ticker.tick().await;
            match tokio::fs::read_to_string(&self.path).await {
                Ok(html) => {
                    if let Some(report) = parse_runner_page(&html, &self.bib) {
                        let _ = tx.send(report);
                    } else {
                        debug!(path = %self.path.display(), "results page has no completed laps yet");
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %self.path.display(), "results page not saved yet");
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "results page unreadable");
                    return Err(e.into());
                }
            }
        }
    }
}
