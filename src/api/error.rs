//! Maps `SprinklerError` onto HTTP status codes and the `{error, message}`
//! body shape, per the status table in the specification's error design.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::api::dto::ErrorResponse;
use crate::error::SprinklerError;

pub struct ApiError(pub SprinklerError);

impl From<SprinklerError> for ApiError {
    fn from(err: SprinklerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SprinklerError::UnknownSprinkler(_) => StatusCode::BAD_REQUEST,
            SprinklerError::InvalidDuration(_) => StatusCode::BAD_REQUEST,
            SprinklerError::NotFound(_) => StatusCode::NOT_FOUND,
            SprinklerError::ConcurrencyExceeded => StatusCode::CONFLICT,
            SprinklerError::BudgetExceeded(_) => StatusCode::CONFLICT,
            SprinklerError::AlreadyOn(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SprinklerError::AlreadyOff(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SprinklerError::DriverError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SprinklerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse { error: self.0.kind(), message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}
