//! The `Job` type and its lifecycle.

use serde::Serialize;

/// Unique, monotonically increasing job identifier, assigned by the scheduler.
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Active,
    Finished,
    Cancelled,
}

/// A single watering request, owned exclusively by the scheduler.
///
/// `list_all`-style queries hand out clones of this struct so callers can
/// never mutate the copy the scheduler keeps.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub sprinkler_id: String,
    pub duration_seconds: f64,
    pub high_priority: bool,
    pub status: JobStatus,
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
}

impl Job {
    pub fn new(job_id: JobId, sprinkler_id: String, duration_seconds: f64, high_priority: bool) -> Self {
        Self {
            job_id,
            sprinkler_id,
            duration_seconds,
            high_priority,
            status: JobStatus::Waiting,
            start_time: None,
            stop_time: None,
        }
    }

    /// `start_time + duration_seconds - now()` for an active job, `None` otherwise.
    pub fn remaining_time(&self, now: f64) -> Option<f64> {
        if self.status != JobStatus::Active {
            return None;
        }
        self.start_time.map(|start| start + self.duration_seconds - now)
    }

    pub fn mark_active(&mut self, now: f64) {
        self.start_time = Some(now);
        self.status = JobStatus::Active;
    }

    pub fn mark_finished(&mut self, now: f64) {
        self.status = JobStatus::Finished;
        self.stop_time = Some(now);
    }

    pub fn mark_cancelled(&mut self, now: f64) {
        self.status = JobStatus::Cancelled;
        self.stop_time = Some(now);
    }
}
