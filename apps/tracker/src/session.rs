//! Shared session state fed by the split sources.
//!
//! Each source resends full snapshots; the session keeps the latest per
//! origin and merges on read. Precedence: a replay overrides everything
//! (it is explicitly requested), official results beat the demo filler,
//! and a field check-in augments whichever base report won, since a crew
//! sighting is usually fresher than the last timing mat.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crew_ingest_core::{channel, ReportOrigin, ReportRx, RunnerReport, SplitSource};

pub struct TrackerSession {
    pub inner: Mutex<Inner>,
}

#[derive(Default)]
pub struct Inner {
    reports: HashMap<ReportOrigin, RunnerReport>,
}

impl TrackerSession {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }
}

impl Default for TrackerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    pub fn feed_report(&mut self, report: RunnerReport) {
        debug!(origin = ?report.origin, splits = report.splits.len(), "report received");
        self.reports.insert(report.origin, report);
    }

    /// Merge the per-origin snapshots into the view the UI renders.
    pub fn merged(&self) -> Option<RunnerReport> {
        if let Some(replay) = self.reports.get(&ReportOrigin::Replay) {
            return Some(replay.clone());
        }
        let base = self
            .reports
            .get(&ReportOrigin::Results)
            .or_else(|| self.reports.get(&ReportOrigin::Demo));
        let checkin = self.reports.get(&ReportOrigin::Checkin);
        match (base, checkin) {
            (Some(base), Some(checkin)) => {
                let mut merged = base.clone();
                merged.splits.extend(checkin.splits.iter().cloned());
                Some(merged)
            }
            (Some(base), None) => Some(base.clone()),
            (None, Some(checkin)) => Some(checkin.clone()),
            (None, None) => None,
        }
    }
}

/// Spawn a source and pump its reports into the session: the source runs on
/// the async runtime, the pump on a blocking thread.
pub fn run_source<S: SplitSource + 'static>(src: S, sess: Arc<TrackerSession>) {
    let (tx, rx): (_, ReportRx) = channel();
    tokio::spawn(async move {
        if let Err(e) = src.run(tx).await {
            warn!(error = %e, "split source stopped");
        }
    });
    thread::spawn(move || loop {
        match rx.recv() {
            Ok(report) => sess.inner.lock().feed_report(report),
            Err(_) => break, // source dropped its sender
        }
    });
}
