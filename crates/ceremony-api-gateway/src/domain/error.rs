//! Maps `ceremony_ports::CoreError` to an HTTP response
//! (`domain::error::ApiError`), using stable string error identifiers
//! rather than a numeric code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ceremony_ports::CoreError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    data: Option<serde_json::Value>,
}

/// Wraps `CoreError` so it can `impl IntoResponse` without violating the
/// orphan rule (`CoreError` lives in `ceremony-ports`).
pub struct ResponseError(pub CoreError);

impl From<CoreError> for ResponseError {
    fn from(err: CoreError) -> Self {
        ResponseError(err)
    }
}

/// Maps any per-crate service error into a `ResponseError` via its
/// `Into<CoreError>` impl. Used as `.map_err(core)?` at route handler call
/// sites so every service crate's distinct error enum funnels through the
/// same HTTP mapping.
pub fn core<E: Into<CoreError>>(err: E) -> ResponseError {
    ResponseError(err.into())
}

fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CoreError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        CoreError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorBody {
            error: self.0.identifier(),
            message: self.0.to_string(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ResponseError(CoreError::NotFound("x".into()));
        assert_eq!(status_for(&err.0), StatusCode::NOT_FOUND);
    }

    #[test]
    fn precondition_failed_maps_to_412() {
        let err = ResponseError(CoreError::PreconditionFailed("x".into()));
        assert_eq!(status_for(&err.0), StatusCode::PRECONDITION_FAILED);
    }
}
