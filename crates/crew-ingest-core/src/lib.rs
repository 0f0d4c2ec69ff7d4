//! Runner-report model and traits shared by every split source.

use serde::{Deserialize, Serialize};

use model::Split;

/// One snapshot of everything a source knows about the tracked runner.
/// Sources resend full snapshots, never increments; the session keeps the
/// latest per source and merges by precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerReport {
    pub name: String,
    pub bib: String,
    pub splits: Vec<Split>,
    /// Elapsed "HH:MM:SS" once the runner has finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_race_time: Option<String>,
    /// Which source produced this snapshot; drives merge precedence.
    pub origin: ReportOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrigin {
    Results,
    Checkin,
    Replay,
    Demo,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Msg(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ReportTx = crossbeam_channel::Sender<RunnerReport>;
pub type ReportRx = crossbeam_channel::Receiver<RunnerReport>;

/// Trait for any live split source connector.
#[async_trait::async_trait]
pub trait SplitSource: Send + Sync {
    async fn run(&self, tx: ReportTx) -> Result<(), IngestError>;
}

pub fn channel() -> (ReportTx, ReportRx) {
    crossbeam_channel::unbounded()
}
