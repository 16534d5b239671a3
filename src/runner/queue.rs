use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::HashMap;

use parking_lot::RwLock;

use super::{JobId, RunMetadata, Runner, StatusMap, ensure_single, poll_with};
use crate::error::{Error, Result};
use crate::trial::Trial;
use crate::types::TrialStatus;

/// An external job system that accepts trials.
///
/// `schedule_job` should hand the work off and return promptly; the runner's
/// `run` returns as soon as it does.
pub trait JobQueue: Send + Sync {
    /// Schedules work for `trial` and returns the job identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue rejects the job.
    fn schedule_job(&self, trial: &Trial) -> Result<JobId>;

    /// Returns the current status of the job running `trial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be reached.
    fn get_job_status(&self, trial: &Trial) -> Result<TrialStatus>;
}

/// Runs trials on a [`JobQueue`].
///
/// # Examples
///
/// ```
/// use trialwrap::runner::{InMemoryQueue, QueueJobRunner, Runner};
/// use trialwrap::{Trial, TrialStatus};
///
/// let runner = QueueJobRunner::new(InMemoryQueue::new());
/// let trial = Trial::new(0);
/// let meta = runner.run(&trial).unwrap();
/// assert_eq!(meta.job_id.as_str(), "job-0");
///
/// runner.queue().set_status(0, TrialStatus::Completed);
/// let statuses = runner.poll_trial_status(&[&trial]).unwrap();
/// assert!(statuses[&TrialStatus::Completed].contains(&0));
/// ```
pub struct QueueJobRunner<Q> {
    queue: Q,
}

impl<Q: JobQueue> QueueJobRunner<Q> {
    /// Creates a runner over `queue`.
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// The underlying queue.
    pub fn queue(&self) -> &Q {
        &self.queue
    }
}

impl<Q: JobQueue> Runner for QueueJobRunner<Q> {
    fn run(&self, trial: &Trial) -> Result<RunMetadata> {
        ensure_single(trial)?;
        let job_id = self.queue.schedule_job(trial)?;
        trace_info!(trial = trial.index(), %job_id, "trial scheduled");
        Ok(RunMetadata { job_id })
    }

    fn poll_trial_status(&self, trials: &[&Trial]) -> Result<StatusMap> {
        poll_with(trials, |trial| self.queue.get_job_status(trial))
    }
}

/// A queue that only records statuses. Jobs never run by themselves.
///
/// Scheduled trials report [`TrialStatus::Running`] until
/// [`set_status`](Self::set_status) moves them on. Unknown trials report
/// [`TrialStatus::Pending`]. A trial that already has a status cannot be
/// scheduled again.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    next_job: AtomicU64,
    statuses: RwLock<HashMap<u64, TrialStatus>>,
}

impl InMemoryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status reported for trial `index`.
    pub fn set_status(&self, index: u64, status: TrialStatus) {
        self.statuses.write().insert(index, status);
    }

    /// Number of trials ever scheduled.
    #[must_use]
    pub fn scheduled(&self) -> u64 {
        self.next_job.load(Ordering::Relaxed)
    }
}

impl JobQueue for InMemoryQueue {
    fn schedule_job(&self, trial: &Trial) -> Result<JobId> {
        let index = trial.index();
        let mut statuses = self.statuses.write();
        if let Some(status) = statuses.get(&index) {
            return Err(Error::invalid_argument(
                "trial",
                format!("trial {index} was already scheduled and is {status}"),
            ));
        }
        statuses.insert(index, TrialStatus::Running);
        let n = self.next_job.fetch_add(1, Ordering::Relaxed);
        Ok(JobId::new(format!("job-{n}")))
    }

    fn get_job_status(&self, trial: &Trial) -> Result<TrialStatus> {
        Ok(self
            .statuses
            .read()
            .get(&trial.index())
            .copied()
            .unwrap_or(TrialStatus::Pending))
    }
}
