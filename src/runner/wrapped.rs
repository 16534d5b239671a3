use super::{JobId, RunMetadata, Runner, StatusMap, ensure_single, poll_with};
use crate::error::Result;
use crate::trial::Trial;
use crate::wrapper::Wrapper;

/// Runs trials through a [`Wrapper`].
///
/// `run` blocks for as long as the wrapper's model run does and returns the
/// trial index as job id, since there is no separate job system. Polling asks
/// the wrapper for each trial's status.
pub struct WrappedJobRunner<W> {
    wrapper: W,
}

impl<W: Wrapper> WrappedJobRunner<W> {
    /// Creates a runner over `wrapper`.
    pub fn new(wrapper: W) -> Self {
        Self { wrapper }
    }

    /// The underlying wrapper.
    pub fn wrapper(&self) -> &W {
        &self.wrapper
    }
}

impl<W: Wrapper> Runner for WrappedJobRunner<W> {
    fn run(&self, trial: &Trial) -> Result<RunMetadata> {
        ensure_single(trial)?;
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("run_model", trial = trial.index(), wrapper = self.wrapper.name()).entered();

        self.wrapper.run_model(trial)?;
        trace_info!(trial = trial.index(), "model run returned");
        Ok(RunMetadata {
            job_id: JobId::from(trial.index()),
        })
    }

    fn poll_trial_status(&self, trials: &[&Trial]) -> Result<StatusMap> {
        poll_with(trials, |trial| self.wrapper.set_trial_status(trial))
    }
}
