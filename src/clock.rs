//! Wall-clock time plus a timer abstraction that delivers fired timers as
//! plain data onto a single channel, rather than as arbitrary closures run on
//! whatever thread happens to own the timer.
//!
//! This is what lets the rest of the core stay free of locks: every timer
//! event, however it originated (a job's own duration, or a runtime-budget
//! tracker's force-off deadline), funnels through the same `mpsc` channel
//! that the scheduler actor reads, so it is processed on the single logical
//! dispatch sequence described in the concurrency model.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::job::JobId;

/// Data describing what fired. The actor resolves these fresh against
/// current state when it receives them, so a timer that raced a concurrent
/// cancellation (e.g. `remove_active_job`) is naturally absorbed as a no-op
/// rather than needing to be suppressed out-of-band.
#[derive(Debug, Clone)]
pub enum TimerEvent {
    /// A job's own duration has elapsed.
    JobDurationElapsed(JobId),
    /// A runtime-budget tracker's force-off deadline has been reached for this sprinkler.
    BudgetForceOff(String),
}

/// Capability to read the current time and schedule one-shot timer events.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
    fn schedule(&self, delay_seconds: f64, event: TimerEvent) -> TimerHandle;
}

/// A pending timer. Cancelling is idempotent: cancelling an already-fired (or
/// already-cancelled) handle is a safe no-op, and never surfaces as an error.
pub struct TimerHandle {
    join: Option<JoinHandle<()>>,
    #[cfg(test)]
    cancelled_flag: Option<std::sync::Arc<std::sync::atomic::AtomicBool>>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        // Aborting a completed task is a documented no-op; this is exactly
        // the "cancel a fired handle" case the spec requires to be benign.
        if let Some(join) = &self.join {
            join.abort();
        }
        #[cfg(test)]
        if let Some(flag) = &self.cancelled_flag {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    /// A handle backed by no task at all, for fake clocks in tests that
    /// never need the handle to actually fire.
    #[cfg(test)]
    pub fn noop_for_test() -> Self {
        Self { join: None, cancelled_flag: None }
    }

    /// Like `noop_for_test`, but flips `flag` when cancelled, so a test can
    /// assert that a specific handle was (or wasn't) cancelled.
    #[cfg(test)]
    pub fn tracked_for_test(flag: std::sync::Arc<std::sync::atomic::AtomicBool>) -> Self {
        Self { join: None, cancelled_flag: Some(flag) }
    }
}

/// The real clock: wall time via `SystemTime`, timers via a sleeping
/// `tokio` task that posts back into a shared channel on completion.
pub struct TokioClock {
    sender: mpsc::UnboundedSender<TimerEvent>,
}

impl TokioClock {
    pub fn new(sender: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self { sender }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs_f64()
    }

    fn schedule(&self, delay_seconds: f64, event: TimerEvent) -> TimerHandle {
        let delay = Duration::from_secs_f64(delay_seconds.max(0.0));
        let sender = self.sender.clone();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiving actor may already be gone during shutdown; that
            // is not this task's concern.
            let _ = sender.send(event);
        });
        TimerHandle {
            join: Some(join),
            #[cfg(test)]
            cancelled_flag: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schedule_delivers_event_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = TokioClock::new(tx);
        let _handle = clock.schedule(0.01, TimerEvent::JobDurationElapsed(1));
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, TimerEvent::JobDurationElapsed(1)));
    }

    #[tokio::test]
    async fn cancelled_timer_never_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = TokioClock::new(tx);
        let handle = clock.schedule(0.05, TimerEvent::JobDurationElapsed(1));
        handle.cancel();
        handle.cancel(); // idempotent
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn now_is_monotonic_enough_for_seconds_since_epoch() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let clock = TokioClock::new(tx);
        assert!(clock.now() > 1_600_000_000.0);
    }
}
