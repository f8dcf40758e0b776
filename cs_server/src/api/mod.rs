//! HTTP API for the Chefshare authentication core.
//!
//! # Modules
//!
//! - [`auth`]: Registration, login, refresh, logout, current user
//! - [`password_reset`]: OTP reset request, confirm and resend
//! - [`email_verification`]: Verification confirm, resend and authenticated request
//! - [`users`]: Profile and password updates for the signed-in user
//! - [`middleware`]: Bearer authentication and the per-IP gate
//!
//! # Endpoints Overview
//!
//! All routes live under `/api/v1`, apart from the root `/health` probe.
//!
//! ```text
//! GET  /health                               - Health check (also /api/v1/health)
//! POST /api/v1/auth/register                 - Register, returns a session (201)
//! POST /api/v1/auth/login                    - Login
//! POST /api/v1/auth/token/refresh            - Rotate a refresh token
//! POST /api/v1/auth/logout                   - Revoke a refresh token (bearer optional)
//! GET  /api/v1/auth/me                       - Current user (bearer)
//! POST /api/v1/auth/password/reset/request   - Send reset code (IP gate)
//! POST /api/v1/auth/password/reset/confirm   - Reset with code (IP gate)
//! POST /api/v1/auth/password/reset/resend    - Send a new code (IP gate)
//! POST /api/v1/auth/verify-email/confirm     - Consume verification token
//! POST /api/v1/auth/verify-email/resend      - Resend verification (IP gate)
//! POST /api/v1/auth/verify-email/request     - Request verification (bearer)
//! PUT  /api/v1/users/me                      - Update profile (bearer)
//! PUT  /api/v1/users/me/password             - Change password (bearer)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cs_server::api::{create_router, AppState};
//! use tower_http::cors::CorsLayer;
//! # async fn example(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_router(state, CorsLayer::permissive());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod email_verification;
pub mod error;
pub mod middleware;
pub mod password_reset;
pub mod request_id;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use chefshare::{AuthService, Database, security::RateLimit};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub db: Database,
    /// Gate for password-reset and verification-resend routes
    pub ip_limiter: Arc<dyn RateLimit>,
    /// Resolve client IPs from proxy headers instead of the socket peer
    pub trust_proxy_headers: bool,
}

/// `{"message": ...}` body shared by several handlers.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .with_state(state)
}

/// CORS policy: permissive when no origins are configured, otherwise an
/// exact allow-list. Unparseable origins are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/token/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/auth/verify-email/confirm",
            post(email_verification::confirm),
        );

    let ip_gated_routes = Router::new()
        .route("/auth/password/reset/request", post(password_reset::request))
        .route("/auth/password/reset/confirm", post(password_reset::confirm))
        .route("/auth/password/reset/resend", post(password_reset::resend))
        .route(
            "/auth/verify-email/resend",
            post(email_verification::resend),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::ip_rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/auth/verify-email/request",
            post(email_verification::request),
        )
        .route("/users/me", put(users::update_profile))
        .route("/users/me/password", put(users::change_password))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(ip_gated_routes)
        .merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","database":true,"version":"1.0.0","timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "database": db_healthy,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
