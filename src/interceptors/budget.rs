use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::Interceptor;
use crate::clock::{Clock, TimerEvent, TimerHandle};
use crate::driver::OutputDriver;
use crate::error::SprinklerError;

/// One rolling window: at most `max_runtime_seconds` of cumulative on-time
/// is allowed within any trailing `window_seconds`.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeWindow {
    pub window_seconds: f64,
    pub max_runtime_seconds: f64,
}

impl RuntimeWindow {
    pub fn new(window_seconds: f64, max_runtime_seconds: f64) -> Self {
        Self { window_seconds, max_runtime_seconds }
    }
}

/// Per-sprinkler runtime history plus whatever is needed to finalize the
/// current run: when it started, and the handle for its scheduled
/// force-off (cancelled if the run ends earlier on its own).
struct RuntimeTracker {
    /// Completed runs, as `(end_time, duration_seconds)`, oldest first.
    history: VecDeque<(f64, f64)>,
    turned_on_at: Option<f64>,
    force_off_handle: Option<TimerHandle>,
}

impl RuntimeTracker {
    fn new() -> Self {
        Self { history: VecDeque::new(), turned_on_at: None, force_off_handle: None }
    }

    fn prune(&mut self, now: f64, horizon_seconds: f64) {
        while let Some(&(end_time, _)) = self.history.front() {
            if now - end_time > horizon_seconds {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Rejects `turn_on` when any configured rolling window has no remaining
/// budget, and schedules a timer to force the sprinkler off the moment the
/// tightest window's budget would otherwise be exceeded.
///
/// The force-off timer posts a `TimerEvent::BudgetForceOff` onto the same
/// channel the scheduler actor reads from, rather than reaching back into
/// the controller directly — see the design notes on the weak-reference
/// trade-off in the original tracker this is modeled on.
pub struct RuntimeBudgetInterceptor {
    next: Box<dyn Interceptor>,
    clock: Arc<dyn Clock>,
    windows: Vec<RuntimeWindow>,
    trackers: HashMap<String, RuntimeTracker>,
}

impl RuntimeBudgetInterceptor {
    pub fn new(next: Box<dyn Interceptor>, clock: Arc<dyn Clock>, windows: Vec<RuntimeWindow>) -> Self {
        Self { next, clock, windows, trackers: HashMap::new() }
    }

    fn horizon_seconds(&self) -> f64 {
        self.windows
            .iter()
            .map(|w| w.window_seconds)
            .fold(0.0_f64, f64::max)
            .max(24.0 * 3600.0)
    }

    /// Smallest remaining budget across all configured windows, for the
    /// given sprinkler at time `now`. `f64::INFINITY` if no windows apply
    /// (an unconfigured sprinkler has no budget ceiling).
    fn remaining_budget(&self, id: &str, now: f64) -> f64 {
        let empty = VecDeque::new();
        let history = self.trackers.get(id).map(|t| &t.history).unwrap_or(&empty);
        self.windows.iter().fold(f64::INFINITY, |acc, w| {
            let used: f64 = history
                .iter()
                .filter(|&&(end_time, _)| now - end_time < w.window_seconds)
                .map(|&(_, duration)| duration)
                .sum();
            acc.min(w.max_runtime_seconds - used)
        })
    }
}

impl Interceptor for RuntimeBudgetInterceptor {
    fn turn_on(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        let id = driver.sprinkler_id().to_string();
        let now = self.clock.now();
        let horizon = self.horizon_seconds();

        let tracker = self.trackers.entry(id.clone()).or_insert_with(RuntimeTracker::new);
        if let Some(handle) = tracker.force_off_handle.take() {
            handle.cancel();
        }
        tracker.prune(now, horizon);

        let remaining = self.remaining_budget(&id, now);
        if remaining < 0.0 {
            return Err(SprinklerError::BudgetExceeded(id));
        }

        self.next.turn_on(driver)?;

        let tracker = self.trackers.get_mut(&id).expect("tracker inserted above");
        tracker.turned_on_at = Some(now);
        if remaining.is_finite() {
            tracker.force_off_handle =
                Some(self.clock.schedule(remaining, TimerEvent::BudgetForceOff(id)));
        }
        Ok(())
    }

    fn turn_off(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        let id = driver.sprinkler_id().to_string();
        let now = self.clock.now();
        let horizon = self.horizon_seconds();

        self.next.turn_off(driver)?;

        if let Some(tracker) = self.trackers.get_mut(&id) {
            if let Some(handle) = tracker.force_off_handle.take() {
                handle.cancel();
            }
            if let Some(started) = tracker.turned_on_at.take() {
                tracker.history.push_back((now, now - started));
            }
            tracker.prune(now, horizon);
        }
        Ok(())
    }
}
