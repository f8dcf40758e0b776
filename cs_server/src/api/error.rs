//! Mapping from library errors to HTTP responses.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chefshare::auth::{AuthError, ErrorKind};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error. Wraps [`AuthError`] and renders it as JSON.
///
/// The body is `{"error": msg}`, except 429 which uses `{"message": msg}`.
/// Internal failures are logged in full and returned as a generic message.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(AuthError::validation(message))
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.0.kind())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Gone => StatusCode::GONE,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
        }

        let message = self.0.client_message();
        let body = if status == StatusCode::TOO_MANY_REQUESTS {
            json!({ "message": message })
        } else {
            json!({ "error": message })
        };

        (status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejection is an [`ApiError`], so malformed bodies
/// get the same `{"error": ...}` shape as every other failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}
