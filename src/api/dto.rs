//! Wire types for the HTTP surface. These are deliberately separate from
//! `job::Job` so the on-disk/in-memory job representation can evolve
//! without dragging `serde` rename attributes through the scheduling core.

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus};

#[derive(Debug, Serialize)]
pub struct JobDto {
    pub job_id: u64,
    pub sprinkler_id: String,
    pub duration: f64,
    pub high_priority: bool,
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub remaining_time: Option<f64>,
    pub status: JobStatusDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusDto {
    Waiting,
    Active,
    Finished,
    Cancelled,
}

impl From<JobStatus> for JobStatusDto {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Waiting => JobStatusDto::Waiting,
            JobStatus::Active => JobStatusDto::Active,
            JobStatus::Finished => JobStatusDto::Finished,
            JobStatus::Cancelled => JobStatusDto::Cancelled,
        }
    }
}

impl JobDto {
    /// `now` is only used to derive `remaining_time` for an active job;
    /// everything else is already stored on the job itself.
    pub fn from_job(job: &Job, now: f64) -> Self {
        Self {
            job_id: job.job_id,
            sprinkler_id: job.sprinkler_id.clone(),
            duration: job.duration_seconds,
            high_priority: job.high_priority,
            start_time: job.start_time,
            stop_time: job.stop_time,
            remaining_time: job.remaining_time(now),
            status: job.status.into(),
        }
    }
}

/// `/courts/{id}` and `/courts` render either the court's current job, or
/// an explicit "inactive" marker when no job is waiting or active for it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CourtDto {
    Job(JobDto),
    Inactive { sprinkler_id: String, status: &'static str },
}

impl CourtDto {
    pub fn inactive(sprinkler_id: impl Into<String>) -> Self {
        CourtDto::Inactive { sprinkler_id: sprinkler_id.into(), status: "inactive" }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub sprinkler_id: String,
    pub duration: f64,
    #[serde(default)]
    pub high_priority: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDurationRequest {
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct CourtRequest {
    pub duration: f64,
    #[serde(default)]
    pub high_priority: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}
