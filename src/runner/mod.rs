//! Dispatching trials for external execution and polling their status.
//!
//! Two runners implement [`Runner`]:
//!
//! | Runner | Dispatch | Status |
//! |--------|----------|--------|
//! | [`QueueJobRunner`] | Hands the trial to a [`JobQueue`] and returns at once | Asks the queue |
//! | [`WrappedJobRunner`] | Runs the [`Wrapper`](crate::wrapper::Wrapper) model synchronously | Asks the wrapper |
//!
//! Polling is a single round per call. The driver owns the cadence, backoff
//! and retries.
//!
//! With the `async` feature, [`TokioJobQueue`] provides a queue that runs jobs
//! on a tokio blocking pool.

mod queue;
#[cfg(feature = "async")]
mod tokio_queue;
mod wrapped;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use queue::{InMemoryQueue, JobQueue, QueueJobRunner};
#[cfg(feature = "async")]
pub use tokio_queue::TokioJobQueue;
pub use wrapped::WrappedJobRunner;

use crate::error::{Error, Result};
use crate::trial::Trial;
use crate::types::{TrialKind, TrialStatus};

/// Trial indices bucketed by status.
pub type StatusMap = BTreeMap<TrialStatus, BTreeSet<u64>>;

/// Opaque identifier of an external job.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for JobId {
    fn from(index: u64) -> Self {
        Self(index.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl core::fmt::Display for JobId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata the driver attaches to a trial after dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// The external job running the trial.
    pub job_id: JobId,
}

impl RunMetadata {
    /// The metadata as a JSON map, ready for
    /// [`Trial::update_run_metadata`].
    #[must_use]
    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("job_id".to_string(), serde_json::Value::String(self.job_id.0));
        map
    }
}

/// Dispatches trials and reports their status.
pub trait Runner: Send + Sync {
    /// Dispatches `trial` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for batch trials, or the backend's
    /// error if dispatch fails.
    fn run(&self, trial: &Trial) -> Result<RunMetadata>;

    /// Polls each trial once and buckets its index by status.
    ///
    /// Trials already in a terminal status are polled like any other.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if a status cannot be read.
    fn poll_trial_status(&self, trials: &[&Trial]) -> Result<StatusMap>;
}

/// Rejects anything but single trials.
pub(crate) fn ensure_single(trial: &Trial) -> Result<()> {
    match trial.kind() {
        TrialKind::Single => Ok(()),
        TrialKind::Batch => Err(Error::TypeMismatch(format!(
            "trial {} is a batch trial; only single trials can be run",
            trial.index()
        ))),
    }
}

/// Polls every trial with `status_of` and buckets the results.
pub(crate) fn poll_with<F>(trials: &[&Trial], mut status_of: F) -> Result<StatusMap>
where
    F: FnMut(&Trial) -> Result<TrialStatus>,
{
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("poll_trial_status", n_trials = trials.len()).entered();

    let mut statuses = StatusMap::new();
    for &trial in trials {
        let status = status_of(trial)?;
        trace_debug!(trial = trial.index(), %status, "polled");
        statuses.entry(status).or_default().insert(trial.index());
    }
    Ok(statuses)
}
