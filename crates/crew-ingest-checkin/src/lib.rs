//! Crowd-sourced field check-ins.
//!
//! Crew members along the course report "saw the runner at km X at time T".
//! The store keeps at most one record per bib, last write wins, and every
//! record expires 24 hours after it was stored. A successful check-in also
//! remembers its bib as the default, so the next crew member's form starts
//! pre-filled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crew_ingest_core::{IngestError, ReportOrigin, ReportTx, RunnerReport, SplitSource};
use model::clock::parse_clock;
use model::{RaceKm, RaceTopology, Split};

pub const CHECKIN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum CheckinError {
    #[error("bib must not be empty")]
    MissingBib,
    #[error("km {0} is outside the course (0..={1})")]
    KmOutOfRange(f64, f64),
    #[error("clock time {0:?} is not like \"9:15 AM\"")]
    BadClockTime(String),
}

/// One accepted check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub id: Uuid,
    pub bib: String,
    pub km: RaceKm,
    pub clock_time: String,
    /// RFC 3339 submission timestamp (UTC).
    pub at: String,
}

struct Entry {
    record: CheckinRecord,
    stored_at: Instant,
}

struct Inner {
    records: HashMap<String, Entry>,
    default_bib: Option<String>,
}

/// In-memory check-in store shared between the submission surface and the
/// split source. Expired records are dropped lazily on read.
pub struct CheckinStore {
    inner: Mutex<Inner>,
    ttl: Duration,
    race_distance_km: f64,
}

impl CheckinStore {
    pub fn new() -> Self {
        Self::with_ttl(CHECKIN_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner { records: HashMap::new(), default_bib: None }),
            ttl,
            race_distance_km: RaceTopology::DEFAULT_RACE_DISTANCE_KM,
        }
    }

    /// Validate and store a check-in, replacing any earlier one for the bib.
    pub fn submit(
        &self,
        bib: &str,
        km: f64,
        clock_time: &str,
    ) -> Result<CheckinRecord, CheckinError> {
        let bib = bib.trim();
        if bib.is_empty() {
            return Err(CheckinError::MissingBib);
        }
        if !km.is_finite() || km < 0.0 || km > self.race_distance_km {
            return Err(CheckinError::KmOutOfRange(km, self.race_distance_km));
        }
        let clock_time = clock_time.trim();
        if parse_clock(clock_time).is_none() {
            return Err(CheckinError::BadClockTime(clock_time.to_string()));
        }

        let record = CheckinRecord {
            id: Uuid::new_v4(),
            bib: bib.to_string(),
            km: RaceKm(km),
            clock_time: clock_time.to_string(),
            at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        };
        let mut inner = self.inner.lock();
        inner.records.insert(
            bib.to_string(),
            Entry { record: record.clone(), stored_at: Instant::now() },
        );
        inner.default_bib = Some(bib.to_string());
        tracing::debug!(bib, km, clock_time, "check-in stored");
        Ok(record)
    }

    /// Latest unexpired check-in for the bib.
    pub fn latest(&self, bib: &str) -> Option<CheckinRecord> {
        let mut inner = self.inner.lock();
        let expired = match inner.records.get(bib) {
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            inner.records.remove(bib);
            return None;
        }
        inner.records.get(bib).map(|e| e.record.clone())
    }

    /// Remove the check-in for one bib.
    pub fn delete(&self, bib: &str) -> bool {
        self.inner.lock().records.remove(bib).is_some()
    }

    /// Remove every check-in; returns how many were dropped.
    pub fn purge(&self) -> usize {
        let mut inner = self.inner.lock();
        let n = inner.records.len();
        inner.records.clear();
        n
    }

    pub fn default_bib(&self) -> Option<String> {
        self.inner.lock().default_bib.clone()
    }

    pub fn set_default_bib(&self, bib: &str) {
        let bib = bib.trim();
        if !bib.is_empty() {
            self.inner.lock().default_bib = Some(bib.to_string());
        }
    }
}

impl Default for CheckinStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Surfaces the latest check-in for one bib as a single-split report.
pub struct CheckinSource {
    pub store: Arc<CheckinStore>,
    pub bib: String,
    pub runner_name: String,
    pub poll: Duration,
}

#[async_trait::async_trait]
impl SplitSource for CheckinSource {
    async fn run(&self, tx: ReportTx) -> Result<(), IngestError> {
        let mut ticker = tokio::time::interval(self.poll);
        loop {
            ticker.tick().await;
            if let Some(record) = self.store.latest(&self.bib) {
                let report = RunnerReport {
                    name: self.runner_name.clone(),
                    bib: self.bib.clone(),
                    splits: vec![Split::new(record.km.0, record.clock_time.clone())],
                    total_race_time: None,
                    origin: ReportOrigin::Checkin,
                };
                let _ = tx.send(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_then_latest_round_trips() {
        let store = CheckinStore::new();
        let rec = store.submit("545", 26.2, "9:05 AM").unwrap();
        assert_eq!(rec.bib, "545");
        assert_eq!(rec.km, RaceKm(26.2));
        assert!(!rec.at.is_empty());
        let fetched = store.latest("545").unwrap();
        assert_eq!(fetched, rec);
        assert!(store.latest("546").is_none());
    }

    #[test]
    fn last_write_wins_per_bib() {
        let store = CheckinStore::new();
        store.submit("545", 10.0, "8:00 AM").unwrap();
        store.submit("545", 20.0, "9:30 AM").unwrap();
        let rec = store.latest("545").unwrap();
        assert_eq!(rec.km, RaceKm(20.0));
        assert_eq!(rec.clock_time, "9:30 AM");
    }

    #[test]
    fn validation_rejects_bad_input() {
        let store = CheckinStore::new();
        assert!(matches!(store.submit("", 10.0, "8:00 AM"), Err(CheckinError::MissingBib)));
        assert!(matches!(
            store.submit("545", -1.0, "8:00 AM"),
            Err(CheckinError::KmOutOfRange(..))
        ));
        assert!(matches!(
            store.submit("545", 150.0, "8:00 AM"),
            Err(CheckinError::KmOutOfRange(..))
        ));
        assert!(matches!(
            store.submit("545", 10.0, "8:00"),
            Err(CheckinError::BadClockTime(_))
        ));
        assert!(matches!(
            store.submit("545", 10.0, "around nineish"),
            Err(CheckinError::BadClockTime(_))
        ));
    }

    #[test]
    fn records_expire_after_the_ttl() {
        let store = CheckinStore::with_ttl(Duration::ZERO);
        store.submit("545", 10.0, "8:00 AM").unwrap();
        assert!(store.latest("545").is_none());
    }

    #[test]
    fn delete_and_purge() {
        let store = CheckinStore::new();
        store.submit("1", 1.0, "7:10 AM").unwrap();
        store.submit("2", 2.0, "7:20 AM").unwrap();
        assert!(store.delete("1"));
        assert!(!store.delete("1"));
        assert_eq!(store.purge(), 1);
        assert!(store.latest("2").is_none());
    }

    #[test]
    fn submit_updates_the_default_bib() {
        let store = CheckinStore::new();
        assert!(store.default_bib().is_none());
        store.submit("545", 5.0, "7:30 AM").unwrap();
        assert_eq!(store.default_bib().as_deref(), Some("545"));
        store.set_default_bib("546");
        assert_eq!(store.default_bib().as_deref(), Some("546"));
        store.set_default_bib("  ");
        assert_eq!(store.default_bib().as_deref(), Some("546"));
    }
}
