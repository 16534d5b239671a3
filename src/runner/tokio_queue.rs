use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;

use super::{JobId, JobQueue};
use crate::error::{Error, Result};
use crate::trial::Trial;
use crate::types::TrialStatus;
use crate::wrapper::Wrapper;

type Job = dyn Fn(&Trial) -> Result<()> + Send + Sync;

/// A [`JobQueue`] that runs each job on tokio's blocking thread pool.
///
/// `schedule_job` returns as soon as the job is spawned. The trial reports
/// [`TrialStatus::Running`] until the job returns, then
/// [`TrialStatus::Completed`] or [`TrialStatus::Failed`]. A job that panics
/// counts as failed. Trials that were never scheduled report
/// [`TrialStatus::Pending`], and a trial is scheduled at most once.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "async")]
/// # {
/// use trialwrap::runner::{QueueJobRunner, Runner, TokioJobQueue};
/// use trialwrap::Trial;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let queue = TokioJobQueue::new(rt.handle().clone(), |_trial| Ok(()));
/// let runner = QueueJobRunner::new(queue);
/// runner.run(&Trial::new(0)).unwrap();
/// # }
/// ```
pub struct TokioJobQueue {
    handle: Handle,
    job: Arc<Job>,
    statuses: Arc<RwLock<HashMap<u64, TrialStatus>>>,
}

impl TokioJobQueue {
    /// Creates a queue spawning `job` on `handle`'s runtime.
    pub fn new<F>(handle: Handle, job: F) -> Self
    where
        F: Fn(&Trial) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            handle,
            job: Arc::new(job),
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a queue on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskError`] when called outside a tokio runtime.
    pub fn current<F>(job: F) -> Result<Self>
    where
        F: Fn(&Trial) -> Result<()> + Send + Sync + 'static,
    {
        let handle = Handle::try_current().map_err(|e| Error::TaskError(e.to_string()))?;
        Ok(Self::new(handle, job))
    }

    /// Creates a queue whose jobs run `wrapper`'s model.
    pub fn from_wrapper(handle: Handle, wrapper: Arc<dyn Wrapper>) -> Self {
        Self::new(handle, move |trial| wrapper.run_model(trial))
    }
}

impl JobQueue for TokioJobQueue {
    fn schedule_job(&self, trial: &Trial) -> Result<JobId> {
        let index = trial.index();
        {
            let mut statuses = self.statuses.write();
            if let Some(status) = statuses.get(&index) {
                return Err(Error::invalid_argument(
                    "trial",
                    format!("trial {index} was already scheduled and is {status}"),
                ));
            }
            statuses.insert(index, TrialStatus::Running);
        }

        let trial = trial.clone();
        let job = Arc::clone(&self.job);
        let statuses = Arc::clone(&self.statuses);
        let blocking = self.handle.spawn_blocking(move || job(&trial));
        // Dropping the JoinHandle detaches the watcher task.
        drop(self.handle.spawn(async move {
            let result = match blocking.await {
                Ok(result) => result,
                Err(e) => Err(Error::TaskError(e.to_string())),
            };
            let status = match result {
                Ok(()) => TrialStatus::Completed,
                Err(_error) => {
                    trace_warn!(trial = index, error = %_error, "job failed");
                    TrialStatus::Failed
                }
            };
            statuses.write().insert(index, status);
        }));

        Ok(JobId::new(format!("tokio-{index}")))
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
