//! Async integration tests for the tokio-backed job queue.
//!
//! These tests are only compiled when the `async` feature is enabled.

#![cfg(feature = "async")]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use parking_lot::Mutex;
use trialwrap::runner::{JobQueue, QueueJobRunner, Runner, TokioJobQueue};
use trialwrap::{Arm, Error, Trial, TrialStatus};

fn trial(index: u64) -> Trial {
    Trial::new(index).with_arm(Arm::new(format!("{index}_0")).with_param("x", 1.0))
}

/// Polls `trial` until it leaves `Running`, giving up after two seconds.
async fn settle(queue: &TokioJobQueue, trial: &Trial) -> TrialStatus {
    for _ in 0..200 {
        let status = queue.get_job_status(trial).expect("status should be readable");
        if status != TrialStatus::Running {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("trial {} never settled", trial.index());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_moves_from_running_to_completed() {
    let (release, gate) = mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let queue = TokioJobQueue::current(move |_trial| {
        gate.lock().recv().map_err(|e| Error::TaskError(e.to_string()))
    })
    .expect("inside a runtime");

    let t = trial(0);
    assert_eq!(queue.get_job_status(&t).unwrap(), TrialStatus::Pending);

    let job_id = queue.schedule_job(&t).expect("spawn should succeed");
    assert_eq!(job_id.as_str(), "tokio-0");
    assert_eq!(queue.get_job_status(&t).unwrap(), TrialStatus::Running);

    release.send(()).unwrap();
    assert_eq!(settle(&queue, &t).await, TrialStatus::Completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_job_reports_failed() {
    let queue = TokioJobQueue::current(|trial| {
        Err(Error::ExternalProcess {
            code: Some(2),
            stderr: format!("trial {} diverged", trial.index()),
        })
    })
    .unwrap();
    let t = trial(1);
    queue.schedule_job(&t).unwrap();
    assert_eq!(settle(&queue, &t).await, TrialStatus::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_job_reports_failed() {
    let queue = TokioJobQueue::current(|_trial| panic!("model crashed")).unwrap();
    let t = trial(2);
    queue.schedule_job(&t).unwrap();
    assert_eq!(settle(&queue, &t).await, TrialStatus::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_completed_trial_is_not_rerun() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let queue = TokioJobQueue::current(move |trial| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(())
        } else {
            Err(Error::TaskError(format!("trial {} ran twice", trial.index())))
        }
    })
    .unwrap();

    let t = trial(1);
    queue.schedule_job(&t).unwrap();
    assert_eq!(settle(&queue, &t).await, TrialStatus::Completed);

    assert!(matches!(
        queue.schedule_job(&t),
        Err(Error::InvalidArgument { ref name, .. }) if name == "trial"
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(queue.get_job_status(&t).unwrap(), TrialStatus::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_runner_over_tokio_queue() {
    let runner = QueueJobRunner::new(
        TokioJobQueue::current(|trial| {
            if trial.index() % 2 == 0 {
                Ok(())
            } else {
                Err(Error::TaskError("odd".into()))
            }
        })
        .unwrap(),
    );
    let trials: Vec<Trial> = (0..4).map(trial).collect();
    for t in &trials {
        runner.run(t).expect("dispatch should not block on the job");
    }
    for t in &trials {
        settle(runner.queue(), t).await;
    }

    let refs: Vec<&Trial> = trials.iter().collect();
    let statuses = runner.poll_trial_status(&refs).unwrap();
    assert_eq!(statuses[&TrialStatus::Completed], BTreeSet::from([0, 2]));
    assert_eq!(statuses[&TrialStatus::Failed], BTreeSet::from([1, 3]));
}

#[test]
fn test_current_outside_runtime_fails() {
    let result = TokioJobQueue::current(|_trial| Ok(()));
    assert!(matches!(result, Err(Error::TaskError(_))));
}
