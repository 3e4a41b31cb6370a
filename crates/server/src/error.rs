//! Problem-details error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use wiredesk_shared::ProblemDetails;

/// Handler error rendered as `application/problem+json`.
#[derive(Debug)]
pub struct ApiProblem(pub ProblemDetails);

pub type ApiResult<T> = Result<T, ApiProblem>;

impl ApiProblem {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::bad_request(detail))
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::unauthorized(detail))
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::not_found(detail))
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::unprocessable(detail))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self(ProblemDetails::internal_error(detail))
    }
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self.0),
        )
            .into_response()
    }
}
