use std::collections::BTreeSet;

use trialwrap::runner::{InMemoryQueue, JobId, JobQueue, QueueJobRunner, Runner};
use trialwrap::{Error, Trial, TrialStatus};

use super::trial;

#[test]
fn test_run_returns_job_id_metadata() {
    let runner = QueueJobRunner::new(InMemoryQueue::new());
    let first = runner.run(&trial(3)).expect("scheduling should succeed");
    let second = runner.run(&trial(4)).expect("scheduling should succeed");
    assert_eq!(first.job_id, JobId::from("job-0"));
    assert_eq!(second.job_id, JobId::from("job-1"));
    assert_eq!(runner.queue().scheduled(), 2);

    let mut t = trial(3);
    t.update_run_metadata(first.into_map());
    assert_eq!(t.run_metadata()["job_id"], "job-0");
}

#[test]
fn test_poll_empty_list() {
    let runner = QueueJobRunner::new(InMemoryQueue::new());
    let statuses = runner.poll_trial_status(&[]).unwrap();
    assert!(statuses.is_empty());
}

#[test]
fn test_poll_buckets_every_trial_once() {
    let runner = QueueJobRunner::new(InMemoryQueue::new());
    let trials: Vec<Trial> = (0..4).map(trial).collect();
    for t in &trials[..3] {
        runner.run(t).unwrap();
    }
    runner.queue().set_status(1, TrialStatus::Completed);
    runner.queue().set_status(2, TrialStatus::Failed);

    let refs: Vec<&Trial> = trials.iter().collect();
    let statuses = runner.poll_trial_status(&refs).unwrap();
    assert_eq!(statuses[&TrialStatus::Running], BTreeSet::from([0]));
    assert_eq!(statuses[&TrialStatus::Completed], BTreeSet::from([1]));
    assert_eq!(statuses[&TrialStatus::Failed], BTreeSet::from([2]));
    assert_eq!(statuses[&TrialStatus::Pending], BTreeSet::from([3]));
    assert_eq!(statuses.values().map(BTreeSet::len).sum::<usize>(), 4);
}

#[test]
fn test_poll_is_idempotent() {
    let runner = QueueJobRunner::new(InMemoryQueue::new());
    let a = trial(0);
    let b = trial(1);
    runner.run(&a).unwrap();
    runner.run(&b).unwrap();
    runner.queue().set_status(0, TrialStatus::Completed);

    let first = runner.poll_trial_status(&[&a, &b]).unwrap();
    let second = runner.poll_trial_status(&[&a, &b]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_batch_trial_is_rejected_before_scheduling() {
    let runner = QueueJobRunner::new(InMemoryQueue::new());
    let result = runner.run(&Trial::batch(9));
    assert!(matches!(result, Err(Error::TypeMismatch(_))));
    assert_eq!(runner.queue().scheduled(), 0);
}

struct Unreachable;

impl JobQueue for Unreachable {
    fn schedule_job(&self, _trial: &Trial) -> trialwrap::Result<JobId> {
        Err(Error::ExternalProcess {
            code: None,
            stderr: "queue offline".into(),
        })
    }

    fn get_job_status(&self, _trial: &Trial) -> trialwrap::Result<TrialStatus> {
        Err(Error::ExternalProcess {
            code: None,
            stderr: "queue offline".into(),
        })
    }
}

#[test]
fn test_queue_errors_propagate() {
    let runner = QueueJobRunner::new(Unreachable);
    let t = trial(0);
    assert!(matches!(runner.run(&t), Err(Error::ExternalProcess { .. })));
    assert!(runner.poll_trial_status(&[&t]).is_err());
}

#[test]
fn test_finished_trial_cannot_be_rescheduled() {
    let runner = QueueJobRunner::new(InMemoryQueue::new());
    let t = trial(1);
    runner.run(&t).unwrap();
    runner.queue().set_status(1, TrialStatus::Completed);

    assert!(matches!(
        runner.run(&t),
        Err(Error::InvalidArgument { ref name, .. }) if name == "trial"
    ));
    assert_eq!(runner.queue().scheduled(), 1);
    let statuses = runner.poll_trial_status(&[&t]).unwrap();
    assert_eq!(statuses[&TrialStatus::Completed], BTreeSet::from([1]));
}
