use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nd_core::Error;
use serde_json::json;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// An error rendered as `{"error": "...", "status": "error"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => Self::bad_request(message),
            Error::InvalidUrl(_) => Self::bad_request(err.to_string()),
            Error::NotFound(message) => Self::not_found(message),
            Error::Duplicate(url) => Self::new(
                StatusCode::CONFLICT,
                format!("An article with url {} already exists", url),
            ),
            Error::Upstream(_) | Error::Http(_) => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
            Error::Config(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            other => {
                tracing::error!(error = %other, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// Non-numeric ids can never match a row.
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::not_found("Not found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": "error",
        }));
        (self.status, body).into_response()
    }
}
