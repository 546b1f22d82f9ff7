//! Wires a sprinkler registry to its interceptor chain.
//!
//! The controller owns every driver and resolves `turn_on`/`turn_off` calls
//! by id, pushing them through whatever chain of interceptors was
//! registered (outermost first). It holds no `async` state and is meant to
//! live entirely inside the scheduler actor's task.

use std::collections::HashMap;

use crate::driver::OutputDriver;
use crate::error::{SprinklerError, SprinklerResult};
use crate::interceptors::{DriverSink, Interceptor};

pub struct SprinklerController {
    drivers: HashMap<String, Box<dyn OutputDriver>>,
    interceptor: Box<dyn Interceptor>,
}

impl SprinklerController {
    pub fn new() -> Self {
        Self { drivers: HashMap::new(), interceptor: Box::new(DriverSink) }
    }

    pub fn add_sprinkler(&mut self, driver: Box<dyn OutputDriver>) {
        self.drivers.insert(driver.sprinkler_id().to_string(), driver);
    }

    /// Registers a new outermost interceptor, wrapping whatever chain was
    /// built so far. Call in order from innermost-semantics to
    /// outermost-semantics: the last interceptor registered runs first.
    pub fn add_interceptor<F>(&mut self, build: F)
    where
        F: FnOnce(Box<dyn Interceptor>) -> Box<dyn Interceptor>,
    {
        let inner = std::mem::replace(&mut self.interceptor, Box::new(DriverSink));
        self.interceptor = build(inner);
    }

    pub fn turn_on(&mut self, sprinkler_id: &str) -> SprinklerResult<()> {
        let driver = self
            .drivers
            .get_mut(sprinkler_id)
            .ok_or_else(|| SprinklerError::UnknownSprinkler(sprinkler_id.to_string()))?;
        self.interceptor.turn_on(driver.as_mut())
    }

    pub fn turn_off(&mut self, sprinkler_id: &str) -> SprinklerResult<()> {
        let driver = self
            .drivers
            .get_mut(sprinkler_id)
            .ok_or_else(|| SprinklerError::UnknownSprinkler(sprinkler_id.to_string()))?;
        self.interceptor.turn_off(driver.as_mut())
    }

    pub fn is_valid(&self, sprinkler_id: &str) -> bool {
        self.drivers.contains_key(sprinkler_id)
    }

    pub fn sprinkler_ids(&self) -> Vec<String> {
        self.drivers.keys().cloned().collect()
    }
}

impl Default for SprinklerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::{Clock, TimerEvent, TimerHandle};
    use crate::driver::DummyDriver;
    use crate::interceptors::{GlobalConcurrencyInterceptor, RuntimeBudgetInterceptor, RuntimeWindow, StateVerificationInterceptor};

    struct NoopClock;
    impl Clock for NoopClock {
        fn now(&self) -> f64 {
            0.0
        }
        fn schedule(&self, _delay_seconds: f64, _event: TimerEvent) -> TimerHandle {
            TimerHandle::noop_for_test()
        }
    }

    fn build_controller(max_active: usize) -> SprinklerController {
        let mut controller = SprinklerController::new();
        controller.add_sprinkler(Box::new(DummyDriver::new("court1")));
        controller.add_sprinkler(Box::new(DummyDriver::new("court2")));
        controller.add_interceptor(|next| Box::new(StateVerificationInterceptor::new(next)));
        controller.add_interceptor(|next| Box::new(GlobalConcurrencyInterceptor::new(next, max_active)));
        let clock: Arc<dyn Clock> = Arc::new(NoopClock);
        controller.add_interceptor(|next| {
            Box::new(RuntimeBudgetInterceptor::new(next, clock, vec![RuntimeWindow::new(3600.0, 1000.0)]))
        });
        controller
    }

    #[test]
    fn unknown_sprinkler_is_rejected_before_reaching_the_chain() {
        let mut controller = build_controller(2);
        assert!(matches!(
            controller.turn_on("ghost"),
            Err(SprinklerError::UnknownSprinkler(_))
        ));
    }

    #[test]
    fn full_chain_runs_outer_to_inner() {
        let mut controller = build_controller(1);
        controller.turn_on("court1").unwrap();
        // second sprinkler is blocked by the concurrency cap, not state or budget
        assert!(matches!(
            controller.turn_on("court2"),
            Err(SprinklerError::ConcurrencyExceeded)
        ));
        controller.turn_off("court1").unwrap();
        assert!(controller.turn_on("court2").is_ok());
    }

    #[test]
    fn sprinkler_ids_reflects_registrations() {
        let controller = build_controller(2);
        let mut ids = controller.sprinkler_ids();
        ids.sort();
        assert_eq!(ids, vec!["court1".to_string(), "court2".to_string()]);
    }
}
