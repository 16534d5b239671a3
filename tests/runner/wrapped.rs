use std::collections::{BTreeSet, HashSet};

use parking_lot::Mutex;
use trialwrap::metric::Kwargs;
use trialwrap::runner::{JobId, Runner, WrappedJobRunner};
use trialwrap::wrapper::Wrapper;
use trialwrap::{Error, Trial, TrialStatus};

use super::trial;

/// Completes every trial it has run. Trials with index 13 fail.
#[derive(Default)]
struct RecordingWrapper {
    ran: Mutex<Vec<u64>>,
    done: Mutex<HashSet<u64>>,
}

impl Wrapper for RecordingWrapper {
    fn run_model(&self, trial: &Trial) -> trialwrap::Result<()> {
        self.ran.lock().push(trial.index());
        if trial.index() == 13 {
            return Err(Error::ExternalProcess {
                code: Some(1),
                stderr: "unlucky".into(),
            });
        }
        self.done.lock().insert(trial.index());
        Ok(())
    }

    fn set_trial_status(&self, trial: &Trial) -> trialwrap::Result<TrialStatus> {
        Ok(if self.done.lock().contains(&trial.index()) {
            TrialStatus::Completed
        } else if self.ran.lock().contains(&trial.index()) {
            TrialStatus::Failed
        } else {
            trial.status()
        })
    }

    fn fetch_trial_data(&self, _trial: &Trial, _kwargs: &Kwargs) -> trialwrap::Result<Kwargs> {
        Ok(Kwargs::new())
    }
}

#[test]
fn test_run_then_poll_reports_completed() {
    let runner = WrappedJobRunner::new(RecordingWrapper::default());
    let t = trial(7);
    let meta = runner.run(&t).expect("model run should succeed");
    assert_eq!(meta.job_id, JobId::from(7));

    let statuses = runner.poll_trial_status(&[&t]).unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[&TrialStatus::Completed], BTreeSet::from([7]));
}

#[test]
fn test_model_failure_propagates_from_run() {
    let runner = WrappedJobRunner::new(RecordingWrapper::default());
    let t = trial(13);
    assert!(matches!(
        runner.run(&t),
        Err(Error::ExternalProcess { code: Some(1), .. })
    ));
    let statuses = runner.poll_trial_status(&[&t]).unwrap();
    assert_eq!(statuses[&TrialStatus::Failed], BTreeSet::from([13]));
}

#[test]
fn test_unrun_trials_keep_their_own_status() {
    let runner = WrappedJobRunner::new(RecordingWrapper::default());
    let mut abandoned = trial(2);
    abandoned.set_status(TrialStatus::Abandoned);
    let fresh = trial(3);
    let statuses = runner.poll_trial_status(&[&abandoned, &fresh]).unwrap();
    assert_eq!(statuses[&TrialStatus::Abandoned], BTreeSet::from([2]));
    assert_eq!(statuses[&TrialStatus::Pending], BTreeSet::from([3]));
}

#[test]
fn test_batch_trial_never_reaches_wrapper() {
    let runner = WrappedJobRunner::new(RecordingWrapper::default());
    assert!(matches!(
        runner.run(&Trial::batch(1)),
        Err(Error::TypeMismatch(_))
    ));
    assert!(runner.wrapper().ran.lock().is_empty());
}

#[cfg(unix)]
mod process {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use trialwrap::metric::{FetchOptions, Metric, MetricFunction};
    use trialwrap::model::ModelCommand;
    use trialwrap::runner::{Runner, WrappedJobRunner};
    use trialwrap::wrapper::{OUTPUT_PATH_KWARG, ProcessWrapper, Wrapper};
    use trialwrap::{Arm, Trial, TrialStatus};

    /// Writes `x` doubled to a `result` file in the output directory.
    const MODEL: &str = r#"awk '/^ *x:/ { print $2 * 2 }' "$2" > "$6/result""#;

    #[test]
    fn test_process_wrapper_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let command = ModelCommand::new("sh").arg("-c").arg(MODEL).arg("model");
        let wrapper = Arc::new(ProcessWrapper::new(
            root.path(),
            root.path().join("obs.csv"),
            serde_yaml::Value::Null,
            command,
        ));
        let runner = WrappedJobRunner::new(Arc::clone(&wrapper));

        let trial = Trial::new(5).with_arm(Arm::new("5_0").with_param("x", 2.0));
        runner.run(&trial).expect("model should exit cleanly");
        let statuses = runner.poll_trial_status(&[&trial]).unwrap();
        assert_eq!(statuses[&TrialStatus::Completed], BTreeSet::from([5]));

        let reader = MetricFunction::custom("read_result", [OUTPUT_PATH_KWARG], |_, kw| {
            let dir = kw[OUTPUT_PATH_KWARG].as_str().unwrap_or_default();
            let text = fs::read_to_string(PathBuf::from(dir).join("result"))?;
            text.trim()
                .parse::<f64>()
                .map_err(|e| trialwrap::Error::InvalidArgument {
                    name: "result".into(),
                    reason: e.to_string(),
                })
        });
        let metric = Metric::builder(reader)
            .wrapper(Arc::clone(&wrapper) as Arc<dyn Wrapper>)
            .build()
            .unwrap();
        let data = metric
            .fetch_trial_data(&trial, &FetchOptions::noiseless())
            .unwrap();
        assert_eq!(data.mean("5_0"), Some(4.0));
    }
}
