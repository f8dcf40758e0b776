//! Authentication and rate-limit middleware.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use cs_server::api::middleware::auth_middleware;
//! # use cs_server::api::AppState;
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let protected_routes: Router = Router::new()
//!     .route("/api/v1/auth/me", get(handler))
//!     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
//!     .with_state(state);
//! # let _ = protected_routes;
//! ```
//!
//! Handlers behind [`auth_middleware`] read the caller with
//! `Extension(user): Extension<AuthUser>`.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chefshare::auth::{AuthError, UserId};
use serde_json::json;

use super::{AppState, client::client_ip, error::ApiError};
use crate::logging::{events, log_security_event};

/// Body returned by the IP gate.
pub const IP_RATE_LIMITED_MESSAGE: &str = "too many requests, please try again later";

/// Caller identity established from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    /// The presented access token, kept so logout can blacklist it
    pub access_token: String,
}

/// Bearer token from the `Authorization` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that validates JWT tokens and injects [`AuthUser`].
///
/// # Behavior
///
/// - **Success**: Token valid and not blacklisted → Injects `AuthUser` → Calls next handler
/// - **Missing header**: Returns `401 Unauthorized`
/// - **Invalid/expired/revoked token**: Returns `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or(AuthError::InvalidToken)?
        .to_string();

    let claims = state.auth.tokens().validate_access_token(&token).await?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        username: claims.username,
        email: claims.email,
        access_token: token,
    });
    Ok(next.run(request).await)
}

/// Per-IP gate for enumeration-sensitive routes.
///
/// Requests without a resolvable address share one `unknown` bucket.
pub async fn ip_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(
        request.headers(),
        request.extensions(),
        state.trust_proxy_headers,
    )
    .unwrap_or_else(|| "unknown".to_string());

    if !state.ip_limiter.allow(&ip) {
        log_security_event(
            events::RATE_LIMITED,
            None,
            Some(&ip),
            &format!("IP gate refused {}", request.uri().path()),
        );
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "message": IP_RATE_LIMITED_MESSAGE })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer eyJ.abc.def"));
        assert_eq!(bearer_token(&headers), Some("eyJ.abc.def"));
    }
}
