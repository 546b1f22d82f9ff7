//! Route handlers. Each is a thin adapter: parse/validate the HTTP-shaped
//! request, call the one matching `SchedulerHandle` operation, shape the
//! reply as a DTO. No policy lives here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::actor::SchedulerHandle;
use crate::api::dto::{
    CourtDto, CourtRequest, CreateJobRequest, CreateJobResponse, ErrorResponse, JobDto, UpdateDurationRequest,
};
use crate::api::error::ApiError;
use crate::job::JobId;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn create_job(
    State(handle): State<SchedulerHandle>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<CreateJobResponse>, ApiError> {
    let job_id = handle.add_job(request.sprinkler_id, request.duration, request.high_priority).await?;
    Ok(Json(CreateJobResponse { job_id }))
}

pub async fn list_jobs(State(handle): State<SchedulerHandle>) -> Json<Vec<JobDto>> {
    let now = handle.now();
    let jobs = handle.list_jobs().await;
    Json(jobs.iter().map(|job| JobDto::from_job(job, now)).collect())
}

pub async fn list_active_jobs(State(handle): State<SchedulerHandle>) -> Json<Vec<JobDto>> {
    let now = handle.now();
    let jobs = handle.list_active_jobs().await;
    Json(jobs.iter().map(|job| JobDto::from_job(job, now)).collect())
}

pub async fn list_waiting_jobs(State(handle): State<SchedulerHandle>) -> Json<Vec<JobDto>> {
    let now = handle.now();
    let jobs = handle.list_waiting_jobs().await;
    Json(jobs.iter().map(|job| JobDto::from_job(job, now)).collect())
}

pub async fn get_job(
    State(handle): State<SchedulerHandle>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobDto>, (StatusCode, Json<ErrorResponse>)> {
    let now = handle.now();
    match handle.get_job(job_id).await {
        Some(job) => Ok(Json(JobDto::from_job(&job, now))),
        None => Err(not_found(job_id)),
    }
}

pub async fn update_job_duration(
    State(handle): State<SchedulerHandle>,
    Path(job_id): Path<JobId>,
    Json(request): Json<UpdateDurationRequest>,
) -> Result<Json<JobDto>, ApiError> {
    let now = handle.now();
    let job = handle.set_duration(job_id, request.duration).await?;
    Ok(Json(JobDto::from_job(&job, now)))
}

pub async fn delete_job(
    State(handle): State<SchedulerHandle>,
    Path(job_id): Path<JobId>,
) -> Result<StatusCode, ApiError> {
    handle.remove_job(job_id).await?;
    Ok(StatusCode::OK)
}

pub async fn list_courts(State(handle): State<SchedulerHandle>) -> Json<Vec<CourtDto>> {
    let now = handle.now();
    let mut sprinkler_ids = handle.sprinkler_ids().await;
    sprinkler_ids.sort();

    let mut courts = Vec::with_capacity(sprinkler_ids.len());
    for sprinkler_id in sprinkler_ids {
        courts.push(court_dto_for(&handle, sprinkler_id, now).await);
    }
    Json(courts)
}

pub async fn get_court(
    State(handle): State<SchedulerHandle>,
    Path(sprinkler_id): Path<String>,
) -> Result<Json<CourtDto>, (StatusCode, Json<ErrorResponse>)> {
    if !handle.is_valid_sprinkler(sprinkler_id.clone()).await {
        return Err(unknown_sprinkler(&sprinkler_id));
    }
    let now = handle.now();
    Ok(Json(court_dto_for(&handle, sprinkler_id, now).await))
}

/// `POST /courts/{id}`: updates the court's in-flight job if one exists,
/// otherwise submits a fresh one — the one place the HTTP layer branches
/// on scheduler state rather than calling a single core operation.
pub async fn submit_court_job(
    State(handle): State<SchedulerHandle>,
    Path(sprinkler_id): Path<String>,
    Json(request): Json<CourtRequest>,
) -> Result<Json<CourtDto>, ApiError> {
    let now = handle.now();
    if let Some(existing) = handle.job_for_sprinkler(sprinkler_id.clone()).await {
        let job = handle.set_duration(existing.job_id, request.duration).await?;
        return Ok(Json(CourtDto::Job(JobDto::from_job(&job, now))));
    }

    handle.add_job(sprinkler_id.clone(), request.duration, request.high_priority).await?;
    Ok(Json(court_dto_for(&handle, sprinkler_id, now).await))
}

async fn court_dto_for(handle: &SchedulerHandle, sprinkler_id: String, now: f64) -> CourtDto {
    match handle.job_for_sprinkler(sprinkler_id.clone()).await {
        Some(job) => CourtDto::Job(JobDto::from_job(&job, now)),
        None => CourtDto::inactive(sprinkler_id),
    }
}

fn not_found(job_id: JobId) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: "not_found", message: format!("job not found: {job_id}") }),
    )
}

fn unknown_sprinkler(sprinkler_id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "unknown_sprinkler",
            message: format!("unknown sprinkler id: {sprinkler_id}"),
        }),
    )
}
