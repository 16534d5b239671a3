//! Execution wrappers: user collaborators that run the model for a trial.
//!
//! A [`Wrapper`] serves two clients. [`WrappedJobRunner`](crate::runner::WrappedJobRunner)
//! calls [`run_model`](Wrapper::run_model) and
//! [`set_trial_status`](Wrapper::set_trial_status), and a
//! [`Metric`](crate::metric::Metric) calls
//! [`fetch_trial_data`](Wrapper::fetch_trial_data) to learn where a trial's
//! outputs are before scoring it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::metric::Kwargs;
use crate::model::ModelCommand;
use crate::trial::Trial;
use crate::types::TrialStatus;
use crate::workdir;

/// Keyword injected by [`ProcessWrapper`] with the trial directory.
pub const TRIAL_DIR_KWARG: &str = "trial_dir";

/// Keyword injected by [`ProcessWrapper`] with the model output path.
pub const OUTPUT_PATH_KWARG: &str = "output_path";

/// A user-supplied collaborator that executes trials.
pub trait Wrapper: Send + Sync {
    /// Runs the model for `trial`. May block until the model exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be started or fails.
    fn run_model(&self, trial: &Trial) -> Result<()>;

    /// Returns the current status of `trial`.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be determined.
    fn set_trial_status(&self, trial: &Trial) -> Result<TrialStatus>;

    /// Keywords to inject into metric evaluation for `trial`.
    ///
    /// The returned keywords take precedence over the caller's `kwargs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the keywords cannot be produced.
    fn fetch_trial_data(&self, trial: &Trial, kwargs: &Kwargs) -> Result<Kwargs> {
        let _ = (trial, kwargs);
        Ok(Kwargs::new())
    }

    /// A short name for logs and metric display.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

impl<W: Wrapper + ?Sized> Wrapper for Arc<W> {
    fn run_model(&self, trial: &Trial) -> Result<()> {
        (**self).run_model(trial)
    }

    fn set_trial_status(&self, trial: &Trial) -> Result<TrialStatus> {
        (**self).set_trial_status(trial)
    }

    fn fetch_trial_data(&self, trial: &Trial, kwargs: &Kwargs) -> Result<Kwargs> {
        (**self).fetch_trial_data(trial, kwargs)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Runs the model as a child process in a per-trial directory.
///
/// For each trial it creates `<experiment_dir>/<index:06>`, writes
/// `config.yml` with the model options and the arm's parameters, and runs the
/// [`ModelCommand`] with the trial directory as output path. The outcome is
/// recorded and reported by [`set_trial_status`](Wrapper::set_trial_status).
pub struct ProcessWrapper {
    experiment_dir: PathBuf,
    data_path: PathBuf,
    model_options: serde_yaml::Value,
    command: ModelCommand,
    statuses: RwLock<HashMap<u64, TrialStatus>>,
}

impl ProcessWrapper {
    /// Creates a wrapper writing trials under `experiment_dir`.
    #[must_use]
    pub fn new(
        experiment_dir: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
        model_options: serde_yaml::Value,
        command: ModelCommand,
    ) -> Self {
        Self {
            experiment_dir: experiment_dir.into(),
            data_path: data_path.into(),
            model_options,
            command,
            statuses: RwLock::new(HashMap::new()),
        }
    }

    /// The experiment directory.
    #[must_use]
    pub fn experiment_dir(&self) -> &Path {
        &self.experiment_dir
    }

    fn record(&self, index: u64, status: TrialStatus) {
        self.statuses.write().insert(index, status);
    }
}

impl Wrapper for ProcessWrapper {
    fn run_model(&self, trial: &Trial) -> Result<()> {
        let arm = trial
            .arms()
            .first()
            .ok_or(Error::EmptyTrial(trial.index()))?;
        let dir = workdir::make_trial_dir(&self.experiment_dir, trial.index())?;
        let config_path = workdir::write_configs(&dir, arm.parameters(), &self.model_options)?;

        self.record(trial.index(), TrialStatus::Running);
        match self.command.run(&config_path, &self.data_path, &dir) {
            Ok(_) => {
                self.record(trial.index(), TrialStatus::Completed);
                Ok(())
            }
            Err(e) => {
                self.record(trial.index(), TrialStatus::Failed);
                Err(e)
            }
        }
    }

    fn set_trial_status(&self, trial: &Trial) -> Result<TrialStatus> {
        Ok(self
            .statuses
            .read()
            .get(&trial.index())
            .copied()
            .unwrap_or_else(|| trial.status()))
    }

    fn fetch_trial_data(&self, trial: &Trial, _kwargs: &Kwargs) -> Result<Kwargs> {
        let dir = workdir::trial_dir(&self.experiment_dir, trial.index());
        let dir = dir.to_string_lossy().into_owned();
        Ok(Kwargs::from([
            (TRIAL_DIR_KWARG.to_string(), dir.clone().into()),
            (OUTPUT_PATH_KWARG.to_string(), dir.into()),
        ]))
    }

    fn name(&self) -> &str {
        "ProcessWrapper"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::trial::Arm;

    fn wrapper(dir: &Path, script: &str) -> ProcessWrapper {
        let options: serde_yaml::Value = serde_yaml::from_str("dz: 0.1\n").unwrap();
        ProcessWrapper::new(
            dir,
            dir.join("obs.csv"),
            options,
            ModelCommand::new("sh").arg("-c").arg(script),
        )
    }

    #[test]
    fn successful_run_is_completed() {
        let root = tempfile::tempdir().unwrap();
        let w = wrapper(root.path(), "exit 0");
        let trial = Trial::new(4).with_arm(Arm::new("4_0").with_param("x", 0.5));
        assert_eq!(w.set_trial_status(&trial).unwrap(), TrialStatus::Pending);
        w.run_model(&trial).unwrap();
        assert_eq!(w.set_trial_status(&trial).unwrap(), TrialStatus::Completed);
        assert!(root.path().join("000004").join("config.yml").is_file());
    }

    #[test]
    fn failed_run_is_failed_and_reported() {
        let root = tempfile::tempdir().unwrap();
        let w = wrapper(root.path(), "exit 1");
        let trial = Trial::new(0).with_arm(Arm::new("0_0"));
        assert!(matches!(
            w.run_model(&trial),
            Err(Error::ExternalProcess { code: Some(1), .. })
        ));
        assert_eq!(w.set_trial_status(&trial).unwrap(), TrialStatus::Failed);
    }

    #[test]
    fn rerun_of_same_index_fails() {
        let root = tempfile::tempdir().unwrap();
        let w = wrapper(root.path(), "exit 0");
        let trial = Trial::new(1).with_arm(Arm::new("1_0"));
        w.run_model(&trial).unwrap();
        assert!(matches!(w.run_model(&trial), Err(Error::Io(_))));
    }

    #[test]
    fn injects_trial_paths() {
        let root = tempfile::tempdir().unwrap();
        let w = wrapper(root.path(), "exit 0");
        let kw = w.fetch_trial_data(&Trial::new(12), &Kwargs::new()).unwrap();
        let expected = root.path().join("000012");
        assert_eq!(kw[TRIAL_DIR_KWARG], expected.to_string_lossy().into_owned());
        assert_eq!(kw[OUTPUT_PATH_KWARG], kw[TRIAL_DIR_KWARG]);
    }
}
