//! HTTP adapter: a thin `axum` layer translating the REST surface in the
//! specification onto `SchedulerHandle` calls. Holds no policy of its own.

pub mod dto;
mod error;
mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::actor::SchedulerHandle;

/// Builds the full application router, with the scheduler handle as shared
/// state. Separated from `main` so integration tests can exercise it
/// directly with `tower::ServiceExt::oneshot`, without binding a socket.
pub fn build_router(handle: SchedulerHandle) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/jobs", post(handlers::create_job).get(handlers::list_jobs))
        .route("/jobs/active", get(handlers::list_active_jobs))
        .route("/jobs/waiting", get(handlers::list_waiting_jobs))
        .route(
            "/jobs/{id}",
            get(handlers::get_job).post(handlers::update_job_duration).delete(handlers::delete_job),
        )
        .route("/courts", get(handlers::list_courts))
        .route("/courts/{id}", get(handlers::get_court).post(handlers::submit_court_job))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(handle)
}
