//! Single-node irrigation-control daemon.
//!
//! The scheduling and safety core (`scheduler`, `controller`, the
//! `interceptors` chain, `clock`) has no notion of HTTP or process
//! lifecycle; `actor` wraps it in the single dispatch task the concurrency
//! model requires, and `api` is the thin adapter on top of that. `main.rs`
//! is just wiring: load config, build the stack below, serve.

pub mod actor;
pub mod api;
pub mod clock;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod interceptors;
pub mod job;
pub mod policy;
pub mod queue;
pub mod scheduler;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::actor::SchedulerHandle;
use crate::clock::TokioClock;
use crate::controller::SprinklerController;
use crate::driver::OutputDriver;
use crate::interceptors::{GlobalConcurrencyInterceptor, RuntimeBudgetInterceptor, RuntimeWindow, StateVerificationInterceptor};
use crate::policy::MaxActiveSprinklerJobPolicy;
use crate::scheduler::SprinklerJobQueue;

/// Tuning knobs that do not come from the `[sprinklers]` config file.
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub max_active: usize,
    pub max_low_priority: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { max_active: 2, max_low_priority: 1 }
    }
}

/// Default rolling-window runtime budgets from §4.3.3: 10 min/hour,
/// 30 min/12h, 1 h/24h.
pub fn default_runtime_windows() -> Vec<RuntimeWindow> {
    vec![
        RuntimeWindow::new(3600.0, 600.0),
        RuntimeWindow::new(43_200.0, 1800.0),
        RuntimeWindow::new(86_400.0, 3600.0),
    ]
}

/// Assembles the clock, controller, interceptor chain and scheduler, spawns
/// the actor task, and hands back the handle the HTTP layer (or a test)
/// talks to. This is the one place that wires the leaves-first dependency
/// order from the component design together.
pub fn build_scheduler(drivers: Vec<Box<dyn OutputDriver>>, config: AppConfig, windows: Vec<RuntimeWindow>) -> SchedulerHandle {
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();
    let clock: Arc<dyn clock::Clock> = Arc::new(TokioClock::new(timer_tx));

    let mut controller = SprinklerController::new();
    for driver in drivers {
        controller.add_sprinkler(driver);
    }
    controller.add_interceptor(|next| Box::new(StateVerificationInterceptor::new(next)));
    controller.add_interceptor(|next| Box::new(GlobalConcurrencyInterceptor::new(next, config.max_active)));
    controller.add_interceptor(|next| Box::new(RuntimeBudgetInterceptor::new(next, clock.clone(), windows)));

    let policy = Box::new(MaxActiveSprinklerJobPolicy { max_total: config.max_active, max_low_priority: config.max_low_priority });
    let scheduler = SprinklerJobQueue::new(controller, policy, clock.clone());

    actor::spawn(scheduler, timer_rx, clock)
}
