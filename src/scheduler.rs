//! The scheduling core: submission, the activation loop, and every way a
//! job can reach a terminal state.
//!
//! This type has no notion of HTTP or channels — it is driven synchronously
//! by whatever owns it (the actor task in `actor.rs`) and never suspends.

use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::{Clock, TimerEvent, TimerHandle};
use crate::controller::SprinklerController;
use crate::error::{SprinklerError, SprinklerResult};
use crate::job::{Job, JobId};
use crate::policy::ActivationPolicy;
use crate::queue::{JobQueue, PriorityJobQueue};

pub struct SprinklerJobQueue {
    controller: SprinklerController,
    policy: Box<dyn ActivationPolicy>,
    clock: Arc<dyn Clock>,
    last_job_id: JobId,
    waiting: PriorityJobQueue,
    active: JobQueue,
    timers: HashMap<JobId, TimerHandle>,
}

impl SprinklerJobQueue {
    pub fn new(controller: SprinklerController, policy: Box<dyn ActivationPolicy>, clock: Arc<dyn Clock>) -> Self {
        Self {
            controller,
            policy,
            clock,
            last_job_id: 0,
            waiting: PriorityJobQueue::new(),
            active: JobQueue::new(),
            timers: HashMap::new(),
        }
    }

    /// Admits a new job. Validation failures are surfaced synchronously;
    /// any failure to actually activate it happens later, silently, from
    /// the job's own perspective (see `attempt_next`).
    pub fn add(&mut self, sprinkler_id: &str, duration_seconds: f64, high_priority: bool) -> SprinklerResult<JobId> {
        if !self.controller.is_valid(sprinkler_id) {
            return Err(SprinklerError::UnknownSprinkler(sprinkler_id.to_string()));
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(SprinklerError::InvalidDuration(duration_seconds.to_string()));
        }

        self.last_job_id += 1;
        let job_id = self.last_job_id;
        let job = Job::new(job_id, sprinkler_id.to_string(), duration_seconds, high_priority);
        self.waiting.push(job);
        self.attempt_next();
        Ok(job_id)
    }

    /// Tries to activate as many waiting jobs as the policy allows, in
    /// priority order. Safe to call redundantly — it is a no-op once the
    /// policy stops admitting the head of the waiting queue.
    fn attempt_next(&mut self) {
        loop {
            let runnable = match self.waiting.peek() {
                Some(job) => {
                    let waiting_snapshot = self.waiting.list_all();
                    let active_snapshot = self.active.list_all();
                    self.policy.is_runnable(job, &waiting_snapshot, &active_snapshot)
                }
                None => return,
            };
            if !runnable {
                return;
            }

            let mut job = self.waiting.pop().expect("peeked above");
            if let Err(err) = self.controller.turn_on(&job.sprinkler_id) {
                tracing::warn!(job_id = job.job_id, sprinkler_id = %job.sprinkler_id, error = %err, "activating sprinkler failed, dropping job");
                continue;
            }

            let now = self.clock.now();
            job.mark_active(now);
            let handle = self.clock.schedule(job.duration_seconds, TimerEvent::JobDurationElapsed(job.job_id));
            self.timers.insert(job.job_id, handle);
            tracing::info!(job_id = job.job_id, sprinkler_id = %job.sprinkler_id, "job activated");
            self.active.push(job);
        }
    }

    /// Updates a job's duration, whether it is currently waiting or active.
    /// An active job whose new duration has already elapsed is cancelled
    /// immediately, matching a direct `remove_active_job`.
    pub fn set_duration(&mut self, job_id: JobId, duration_seconds: f64) -> SprinklerResult<Job> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(SprinklerError::InvalidDuration(duration_seconds.to_string()));
        }

        if self.waiting.contains(job_id) {
            let mut job = self.waiting.remove(job_id)?;
            job.duration_seconds = duration_seconds;
            let snapshot = job.clone();
            self.waiting.push(job);
            return Ok(snapshot);
        }

        if self.active.contains(job_id) {
            let now = self.clock.now();
            let start_time = self.active.get(job_id).and_then(|j| j.start_time).unwrap_or(now);
            let remaining = start_time + duration_seconds - now;

            if remaining > 0.0 {
                if let Some(handle) = self.timers.remove(&job_id) {
                    handle.cancel();
                }
                let handle = self.clock.schedule(remaining, TimerEvent::JobDurationElapsed(job_id));
                self.timers.insert(job_id, handle);
                let mut job = self.active.remove(job_id)?;
                job.duration_seconds = duration_seconds;
                let snapshot = job.clone();
                self.active.push(job);
                return Ok(snapshot);
            }

            return self.cancel_active_job(job_id);
        }

        Err(SprinklerError::NotFound(job_id))
    }

    /// Called by the actor when a job's own duration timer fires.
    pub fn on_duration_elapsed(&mut self, job_id: JobId) {
        self.timers.remove(&job_id);
        let Ok(mut job) = self.active.remove(job_id) else {
            // Already removed via another path (explicit cancellation,
            // budget force-off) — the timer event is a benign no-op.
            return;
        };

        let now = self.clock.now();
        job.mark_finished(now);
        tracing::info!(job_id, sprinkler_id = %job.sprinkler_id, "job finished");

        if let Err(err) = self.controller.turn_off(&job.sprinkler_id) {
            tracing::warn!(job_id, sprinkler_id = %job.sprinkler_id, error = %err, "deactivating sprinkler failed");
        }
        self.attempt_next();
    }

    /// Called by the actor when a runtime-budget force-off timer fires for
    /// a sprinkler. If that sprinkler has no active job (it may have ended
    /// through another path already), this is a no-op.
    pub fn on_budget_force_off(&mut self, sprinkler_id: &str) {
        let job_id = match self.active.list_all().iter().find(|j| j.sprinkler_id == sprinkler_id) {
            Some(job) => job.job_id,
            None => return,
        };
        tracing::warn!(job_id, sprinkler_id, "runtime budget exhausted, forcing sprinkler off");
        let _ = self.cancel_active_job(job_id);
    }

    pub fn remove_waiting_job(&mut self, job_id: JobId) -> SprinklerResult<Job> {
        let mut job = self.waiting.remove(job_id)?;
        let now = self.clock.now();
        job.mark_cancelled(now);
        Ok(job)
    }

    pub fn remove_active_job(&mut self, job_id: JobId) -> SprinklerResult<Job> {
        self.cancel_active_job(job_id)
    }

    fn cancel_active_job(&mut self, job_id: JobId) -> SprinklerResult<Job> {
        let mut job = self.active.remove(job_id)?;
        if let Some(handle) = self.timers.remove(&job_id) {
            handle.cancel();
        }
        let now = self.clock.now();
        job.mark_cancelled(now);

        if let Err(err) = self.controller.turn_off(&job.sprinkler_id) {
            tracing::warn!(job_id, sprinkler_id = %job.sprinkler_id, error = %err, "deactivating sprinkler failed");
        }
        self.attempt_next();
        Ok(job)
    }

    pub fn list_waiting_jobs(&self) -> Vec<Job> {
        self.waiting.list_all()
    }

    pub fn list_active_jobs(&self) -> Vec<Job> {
        self.active.list_all()
    }

    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs = self.active.list_all();
        jobs.extend(self.waiting.list_all());
        jobs
    }

    pub fn is_job_active(&self, job_id: JobId) -> bool {
        self.active.contains(job_id)
    }

    pub fn is_job_waiting(&self, job_id: JobId) -> bool {
        self.waiting.contains(job_id)
    }

    pub fn get_waiting_job(&self, job_id: JobId) -> Option<Job> {
        self.waiting.get(job_id).cloned()
    }

    pub fn get_active_job(&self, job_id: JobId) -> Option<Job> {
        self.active.get(job_id).cloned()
    }

    pub fn get_job(&self, job_id: JobId) -> Option<Job> {
        self.get_active_job(job_id).or_else(|| self.get_waiting_job(job_id))
    }

    pub fn is_valid_sprinkler(&self, sprinkler_id: &str) -> bool {
        self.controller.is_valid(sprinkler_id)
    }

    pub fn sprinkler_ids(&self) -> Vec<String> {
        self.controller.sprinkler_ids()
    }

    /// Current job for a sprinkler (active or waiting, whichever exists),
    /// used by the `/courts` surface to decide between "update" and
    /// "submit a new job".
    pub fn job_for_sprinkler(&self, sprinkler_id: &str) -> Option<Job> {
        self.active
            .list_all()
            .into_iter()
            .find(|j| j.sprinkler_id == sprinkler_id)
            .or_else(|| self.waiting.list_all().into_iter().find(|j| j.sprinkler_id == sprinkler_id))
    }

    /// Turns off every active sprinkler and cancels every outstanding
    /// timer, for a clean shutdown. Jobs are left `cancelled`.
    pub fn shutdown(&mut self) {
        for handle in self.timers.values() {
            handle.cancel();
        }
        self.timers.clear();
        for job in self.active.list_all() {
            if let Err(err) = self.controller.turn_off(&job.sprinkler_id) {
                tracing::warn!(job_id = job.job_id, sprinkler_id = %job.sprinkler_id, error = %err, "shutdown: deactivating sprinkler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::controller::SprinklerController;
    use crate::driver::DummyDriver;
    use crate::interceptors::{GlobalConcurrencyInterceptor, RuntimeBudgetInterceptor, RuntimeWindow, StateVerificationInterceptor};
    use crate::job::JobStatus;
    use crate::policy::MaxActiveSprinklerJobPolicy;

    struct FakeClock {
        now: Mutex<f64>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self { now: Mutex::new(0.0) }
        }
        fn advance(&self, delta: f64) {
            *self.now.lock().unwrap() += delta;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> f64 {
            *self.now.lock().unwrap()
        }
        fn schedule(&self, _delay_seconds: f64, _event: TimerEvent) -> TimerHandle {
            TimerHandle::noop_for_test()
        }
    }

    fn build_queue(clock: Arc<dyn Clock>, max_total: usize, max_low_priority: usize) -> SprinklerJobQueue {
        let mut controller = SprinklerController::new();
        controller.add_sprinkler(Box::new(DummyDriver::new("court1")));
        controller.add_sprinkler(Box::new(DummyDriver::new("court2")));
        controller.add_sprinkler(Box::new(DummyDriver::new("court3")));
        controller.add_interceptor(|next| Box::new(StateVerificationInterceptor::new(next)));
        controller.add_interceptor(|next| Box::new(GlobalConcurrencyInterceptor::new(next, max_total)));
        controller.add_interceptor(|next| {
            Box::new(RuntimeBudgetInterceptor::new(next, clock.clone(), vec![RuntimeWindow::new(3600.0, 10_000.0)]))
        });
        let policy = Box::new(MaxActiveSprinklerJobPolicy { max_total, max_low_priority });
        SprinklerJobQueue::new(controller, policy, clock)
    }

    #[test]
    fn add_rejects_unknown_sprinkler_and_bad_duration() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 2, 1);
        assert!(matches!(queue.add("ghost", 10.0, false), Err(SprinklerError::UnknownSprinkler(_))));
        assert!(matches!(queue.add("court1", 0.0, false), Err(SprinklerError::InvalidDuration(_))));
        assert!(matches!(queue.add("court1", f64::NAN, false), Err(SprinklerError::InvalidDuration(_))));
    }

    #[test]
    fn job_ids_are_monotonic_and_first_job_activates_immediately() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 2, 1);
        let a = queue.add("court1", 10.0, false).unwrap();
        let b = queue.add("court2", 10.0, false).unwrap();
        assert_eq!(b, a + 1);
        assert!(queue.is_job_active(a));
    }

    #[test]
    fn concurrency_cap_leaves_extra_low_priority_jobs_waiting() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 2, 1);
        let a = queue.add("court1", 10.0, false).unwrap();
        let b = queue.add("court2", 10.0, false).unwrap();
        let c = queue.add("court3", 10.0, false).unwrap();

        assert!(queue.is_job_active(a));
        assert!(queue.is_job_waiting(b));
        assert!(queue.is_job_waiting(c));
    }

    #[test]
    fn high_priority_job_takes_the_second_slot_over_a_waiting_low_priority_one() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 2, 1);
        let low1 = queue.add("court1", 10.0, false).unwrap();
        let low2 = queue.add("court2", 10.0, false).unwrap();
        let high = queue.add("court3", 10.0, true).unwrap();

        assert!(queue.is_job_active(low1));
        assert!(queue.is_job_active(high));
        assert!(queue.is_job_waiting(low2));
    }

    #[test]
    fn duration_elapsed_frees_the_slot_for_the_next_waiting_job() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 1, 1);
        let a = queue.add("court1", 10.0, false).unwrap();
        let b = queue.add("court2", 10.0, false).unwrap();
        assert!(queue.is_job_waiting(b));

        queue.on_duration_elapsed(a);
        assert_eq!(queue.get_job(a).unwrap().status, JobStatus::Finished);
        assert!(queue.is_job_active(b));
    }

    #[test]
    fn remove_active_job_turns_sprinkler_off_and_frees_slot() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 1, 1);
        let a = queue.add("court1", 10.0, false).unwrap();
        let b = queue.add("court2", 10.0, false).unwrap();

        let cancelled = queue.remove_active_job(a).unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert!(queue.is_job_active(b));
    }

    #[test]
    fn duration_reduction_on_active_job_that_already_elapsed_cancels_it() {
        let clock = Arc::new(FakeClock::new());
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let mut queue = build_queue(clock_dyn, 2, 1);
        let a = queue.add("court1", 10.0, false).unwrap();
        clock.advance(8.0);

        let job = queue.set_duration(a, 5.0).unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(!queue.is_job_active(a));
    }

    #[test]
    fn duration_increase_on_active_job_reschedules_without_cancelling() {
        let clock = Arc::new(FakeClock::new());
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let mut queue = build_queue(clock_dyn, 2, 1);
        let a = queue.add("court1", 10.0, false).unwrap();

        let job = queue.set_duration(a, 20.0).unwrap();
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.duration_seconds, 20.0);
        assert!(queue.is_job_active(a));
    }

    #[test]
    fn budget_force_off_on_sprinkler_with_no_active_job_is_a_no_op() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 2, 1);
        queue.on_budget_force_off("court1");
        assert!(queue.list_active_jobs().is_empty());
    }

    #[test]
    fn shutdown_turns_off_every_active_sprinkler() {
        let clock = Arc::new(FakeClock::new());
        let mut queue = build_queue(clock, 2, 1);
        queue.add("court1", 10.0, false).unwrap();
        queue.add("court2", 10.0, true).unwrap();
        queue.shutdown();
        // shutdown does not mutate queue bookkeeping, only hardware state;
        // a subsequent turn_off attempt on the controller would now fail
        // state verification, which is exactly the invariant being protected.
        assert!(matches!(
            queue.remove_active_job(1),
            Ok(_)
        ));
    }
}
