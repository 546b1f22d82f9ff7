//! The single task that owns the scheduler and controller.
//!
//! Everything else — HTTP handlers, timer firings — talks to this task
//! exclusively through `SchedulerHandle`, a cheaply-cloneable sender. This
//! is what lets the scheduling core stay lock-free: all mutation happens on
//! one task's event loop, serialized by the channel itself.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::clock::{Clock, TimerEvent};
use crate::error::SprinklerResult;
use crate::job::{Job, JobId};
use crate::scheduler::SprinklerJobQueue;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    AddJob { sprinkler_id: String, duration_seconds: f64, high_priority: bool, reply: Reply<SprinklerResult<JobId>> },
    SetDuration { job_id: JobId, duration_seconds: f64, reply: Reply<SprinklerResult<Job>> },
    RemoveJob { job_id: JobId, reply: Reply<SprinklerResult<Job>> },
    ListJobs { reply: Reply<Vec<Job>> },
    ListActiveJobs { reply: Reply<Vec<Job>> },
    ListWaitingJobs { reply: Reply<Vec<Job>> },
    GetJob { job_id: JobId, reply: Reply<Option<Job>> },
    ListSprinklerIds { reply: Reply<Vec<String>> },
    JobForSprinkler { sprinkler_id: String, reply: Reply<Option<Job>> },
    IsValidSprinkler { sprinkler_id: String, reply: Reply<bool> },
    Shutdown { reply: Reply<()> },
}

/// A cheap, cloneable handle to the scheduler actor. Every method sends a
/// command and awaits its reply; the actor itself never suspends mid-command.
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    clock: Arc<dyn Clock>,
}

impl SchedulerHandle {
    /// Current wall-clock time, for the HTTP layer to stamp `remaining_time`
    /// onto a job snapshot without round-tripping through the actor —
    /// reading the clock has no effect on core state, so it does not need
    /// to be serialized through the command channel.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub async fn add_job(&self, sprinkler_id: String, duration_seconds: f64, high_priority: bool) -> SprinklerResult<JobId> {
        self.call(|reply| Command::AddJob { sprinkler_id, duration_seconds, high_priority, reply }).await
    }

    pub async fn set_duration(&self, job_id: JobId, duration_seconds: f64) -> SprinklerResult<Job> {
        self.call(|reply| Command::SetDuration { job_id, duration_seconds, reply }).await
    }

    pub async fn remove_job(&self, job_id: JobId) -> SprinklerResult<Job> {
        self.call(|reply| Command::RemoveJob { job_id, reply }).await
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.call(|reply| Command::ListJobs { reply }).await
    }

    pub async fn list_active_jobs(&self) -> Vec<Job> {
        self.call(|reply| Command::ListActiveJobs { reply }).await
    }

    pub async fn list_waiting_jobs(&self) -> Vec<Job> {
        self.call(|reply| Command::ListWaitingJobs { reply }).await
    }

    pub async fn get_job(&self, job_id: JobId) -> Option<Job> {
        self.call(|reply| Command::GetJob { job_id, reply }).await
    }

    pub async fn sprinkler_ids(&self) -> Vec<String> {
        self.call(|reply| Command::ListSprinklerIds { reply }).await
    }

    pub async fn job_for_sprinkler(&self, sprinkler_id: String) -> Option<Job> {
        self.call(|reply| Command::JobForSprinkler { sprinkler_id, reply }).await
    }

    pub async fn is_valid_sprinkler(&self, sprinkler_id: String) -> bool {
        self.call(|reply| Command::IsValidSprinkler { sprinkler_id, reply }).await
    }

    pub async fn shutdown(&self) {
        self.call(Command::Shutdown).await
    }

    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> T {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .expect("scheduler actor task is still running for the lifetime of the process");
        reply_rx.await.expect("scheduler actor never drops a reply sender without answering")
    }
}

/// Spawns the actor task and returns a handle to it.
///
/// `timer_events` is the receiving half of the channel whose sending half
/// was already handed to the `Clock` used to build both `scheduler` and the
/// controller it wraps — constructed before this call so the clock can be
/// shared between the runtime-budget interceptor and the job queue.
pub fn spawn(
    mut scheduler: SprinklerJobQueue,
    mut timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    clock: Arc<dyn Clock>,
) -> SchedulerHandle {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(command) = command_rx.recv() => {
                    handle_command(&mut scheduler, command);
                }
                Some(event) = timer_rx.recv() => {
                    handle_timer_event(&mut scheduler, event);
                }
                else => break,
            }
        }
        scheduler.shutdown();
    });

    SchedulerHandle { commands: command_tx, clock }
}

fn handle_command(scheduler: &mut SprinklerJobQueue, command: Command) {
    match command {
        Command::AddJob { sprinkler_id, duration_seconds, high_priority, reply } => {
            let _ = reply.send(scheduler.add(&sprinkler_id, duration_seconds, high_priority));
        }
        Command::SetDuration { job_id, duration_seconds, reply } => {
            let _ = reply.send(scheduler.set_duration(job_id, duration_seconds));
        }
        Command::RemoveJob { job_id, reply } => {
            let result = if scheduler.is_job_active(job_id) {
                scheduler.remove_active_job(job_id)
            } else {
                scheduler.remove_waiting_job(job_id)
            };
            let _ = reply.send(result);
        }
        Command::ListJobs { reply } => {
            let _ = reply.send(scheduler.list_jobs());
        }
        Command::ListActiveJobs { reply } => {
            let _ = reply.send(scheduler.list_active_jobs());
        }
        Command::ListWaitingJobs { reply } => {
            let _ = reply.send(scheduler.list_waiting_jobs());
        }
        Command::GetJob { job_id, reply } => {
            let _ = reply.send(scheduler.get_job(job_id));
        }
        Command::ListSprinklerIds { reply } => {
            let _ = reply.send(scheduler.sprinkler_ids());
        }
        Command::JobForSprinkler { sprinkler_id, reply } => {
            let _ = reply.send(scheduler.job_for_sprinkler(&sprinkler_id));
        }
        Command::IsValidSprinkler { sprinkler_id, reply } => {
            let _ = reply.send(scheduler.is_valid_sprinkler(&sprinkler_id));
        }
        Command::Shutdown { reply } => {
            scheduler.shutdown();
            let _ = reply.send(());
        }
    }
}

fn handle_timer_event(scheduler: &mut SprinklerJobQueue, event: TimerEvent) {
    match event {
        TimerEvent::JobDurationElapsed(job_id) => scheduler.on_duration_elapsed(job_id),
        TimerEvent::BudgetForceOff(sprinkler_id) => scheduler.on_budget_force_off(&sprinkler_id),
    }
}
