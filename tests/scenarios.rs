//! Scheduler-level scenarios driven with the real `tokio`-backed clock and
//! short real delays, for behaviour that is inherently about timer races —
//! the seed scenarios from the specification's testable-properties section.

use std::time::Duration;

use sprinkler_daemon::driver::{DummyDriver, OutputDriver};
use sprinkler_daemon::interceptors::RuntimeWindow;
use sprinkler_daemon::job::JobStatus;
use sprinkler_daemon::{build_scheduler, AppConfig};

fn drivers(ids: &[&str]) -> Vec<Box<dyn OutputDriver>> {
    ids.iter().map(|id| Box::new(DummyDriver::new(*id)) as Box<dyn OutputDriver>).collect()
}

fn generous_windows() -> Vec<RuntimeWindow> {
    vec![RuntimeWindow::new(3600.0, 10_000.0)]
}

#[tokio::test]
async fn basic_run_activates_immediately_and_finishes_on_its_own() {
    let handle = build_scheduler(drivers(&["court1"]), AppConfig { max_active: 2, max_low_priority: 1 }, generous_windows());

    let job_id = handle.add_job("court1".to_string(), 0.2, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.get_job(job_id).await.unwrap().status == JobStatus::Active);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let job = handle.get_job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Finished);
    assert!(handle.list_active_jobs().await.is_empty());
}

#[tokio::test]
async fn high_priority_job_takes_the_second_slot_while_a_low_priority_one_waits() {
    let handle = build_scheduler(
        drivers(&["court1", "court2", "court3"]),
        AppConfig { max_active: 2, max_low_priority: 1 },
        generous_windows(),
    );

    let low1 = handle.add_job("court1".to_string(), 1.0, false).await.unwrap();
    let low2 = handle.add_job("court2".to_string(), 1.0, false).await.unwrap();
    let high = handle.add_job("court3".to_string(), 1.0, true).await.unwrap();

    assert_eq!(handle.get_job(low1).await.unwrap().status, JobStatus::Active);
    assert_eq!(handle.get_job(high).await.unwrap().status, JobStatus::Active);
    assert_eq!(handle.get_job(low2).await.unwrap().status, JobStatus::Waiting);
}

#[tokio::test]
async fn runtime_budget_forces_the_sprinkler_off_before_its_own_duration_elapses() {
    let tight_budget = vec![RuntimeWindow::new(3600.0, 0.15)];
    let handle = build_scheduler(drivers(&["court1"]), AppConfig { max_active: 2, max_low_priority: 1 }, tight_budget);

    let job_id = handle.add_job("court1".to_string(), 5.0, false).await.unwrap();
    assert_eq!(handle.get_job(job_id).await.unwrap().status, JobStatus::Active);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let job = handle.get_job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled, "budget force-off should have cancelled the job well before its 5s duration");
    assert!(handle.list_active_jobs().await.is_empty());
}

#[tokio::test]
async fn reducing_duration_below_elapsed_time_cancels_the_job_immediately() {
    let handle = build_scheduler(drivers(&["court1"]), AppConfig { max_active: 2, max_low_priority: 1 }, generous_windows());

    let job_id = handle.add_job("court1".to_string(), 5.0, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // elapsed is already ~0.2s; shrinking to 0.05s must cancel it on the spot
    let job = handle.set_duration(job_id, 0.05).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn increasing_duration_reschedules_without_interrupting_the_run() {
    let handle = build_scheduler(drivers(&["court1"]), AppConfig { max_active: 2, max_low_priority: 1 }, generous_windows());

    let job_id = handle.add_job("court1".to_string(), 0.2, false).await.unwrap();
    handle.set_duration(job_id, 0.5).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    // original 0.2s deadline has passed, but the reschedule should keep it running
    assert_eq!(handle.get_job(job_id).await.unwrap().status, JobStatus::Active);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(handle.get_job(job_id).await.unwrap().status, JobStatus::Finished);
}

#[tokio::test]
async fn removing_an_active_job_just_before_its_own_expiry_is_a_clean_single_turn_off() {
    let handle = build_scheduler(drivers(&["court1"]), AppConfig { max_active: 2, max_low_priority: 1 }, generous_windows());

    let job_id = handle.add_job("court1".to_string(), 0.15, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    let removed = handle.remove_job(job_id).await.unwrap();
    assert_eq!(removed.status, JobStatus::Cancelled);

    // give the original duration timer, if it still fired, a chance to race in
    tokio::time::sleep(Duration::from_millis(100)).await;
    let job = handle.get_job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled, "the expiry timer must not resurrect a job already removed");

    // the sprinkler must still be controllable afterwards: a stray second
    // turn_off from the race would have left the state-verification flag
    // disagreeing, and this next job would fail AlreadyOn/AlreadyOff.
    let next = handle.add_job("court1".to_string(), 0.1, false).await.unwrap();
    assert_eq!(handle.get_job(next).await.unwrap().status, JobStatus::Active);
}

#[tokio::test]
async fn concurrency_cap_rejection_drops_the_job_without_crashing_the_loop() {
    let handle = build_scheduler(
        drivers(&["court1", "court2", "court3"]),
        AppConfig { max_active: 1, max_low_priority: 1 },
        generous_windows(),
    );

    let a = handle.add_job("court1".to_string(), 0.3, false).await.unwrap();
    let b = handle.add_job("court2".to_string(), 0.3, false).await.unwrap();
    assert_eq!(handle.get_job(a).await.unwrap().status, JobStatus::Active);
    assert_eq!(handle.get_job(b).await.unwrap().status, JobStatus::Waiting);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(handle.get_job(a).await.unwrap().status, JobStatus::Finished);
    assert_eq!(handle.get_job(b).await.unwrap().status, JobStatus::Active);
}
