//! Session handlers: register, login, refresh, logout, current user.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "home_cook", "email": "cook@example.com", "password": "Passw0rd!"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "cook@example.com", "password": "Passw0rd!"}'
//! ```

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chefshare::auth::{
    AuthError, AuthSession, LoginRequest, RegisterRequest, SessionTokens, UserProfile,
};
use serde::{Deserialize, Serialize};

use super::{
    AppState, MessageResponse,
    client::ClientMeta,
    error::{ApiError, ApiJson, ApiResult},
    message,
    middleware::{AuthUser, bearer_token},
};
use crate::logging::{events, log_security_event};

pub const MISSING_REFRESH_TOKEN: &str = "missing refresh token";

/// Body of refresh and logout. The token is only ever read from here.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenPayload {
    #[serde(default)]
    pub refresh_token: String,
}

impl RefreshTokenPayload {
    fn token(&self) -> Result<&str, ApiError> {
        let token = self.refresh_token.trim();
        if token.is_empty() {
            return Err(ApiError::bad_request(MISSING_REFRESH_TOKEN));
        }
        Ok(token)
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub tokens: SessionTokens,
    pub user: UserProfile,
}

impl SessionResponse {
    fn new(message: &'static str, session: AuthSession) -> Self {
        Self {
            message,
            tokens: session.tokens,
            user: session.user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokensResponse {
    pub message: &'static str,
    pub tokens: SessionTokens,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

/// Register a new user account and open its first session.
///
/// # Request Body
///
/// ```json
/// {
///   "username": "home_cook",
///   "email": "cook@example.com",
///   "password": "Passw0rd!",
///   "first_name": "Ada",            // Optional
///   "last_name": "Lovelace",        // Optional
///   "bio": "Sourdough enthusiast",  // Optional
///   "profile_picture": "https://cdn.example.com/ada.png"  // Optional
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{message, tokens, user}`. A verification email is
/// queued in the background.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed username, email, password or picture URL
/// - `409 Conflict`: Username or email already registered
pub async fn register(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.auth.register(payload, &client).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new("user created successfully", session)),
    ))
}

/// Authenticate by email and password.
///
/// # Errors
///
/// - `401 Unauthorized`: `invalid email or password`, whichever field was wrong
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let email = payload.email.clone();

    match state.auth.login(payload, &client).await {
        Ok(session) => Ok(Json(SessionResponse::new("login successful", session))),
        Err(AuthError::InvalidCredentials) => {
            log_security_event(
                events::FAILED_LOGIN,
                None,
                client.ip_address.as_deref(),
                &format!("Invalid credentials for {}", email.trim()),
            );
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Rotate a refresh token into a new pair.
///
/// The presented token is consumed; presenting it again fails.
///
/// # Errors
///
/// - `400 Bad Request`: No `refresh_token` in the body
/// - `401 Unauthorized`: Unknown, expired or already rotated token
pub async fn refresh_token(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    ApiJson(payload): ApiJson<RefreshTokenPayload>,
) -> ApiResult<Json<TokensResponse>> {
    let token = payload.token()?;

    match state.auth.refresh(token).await {
        Ok(tokens) => Ok(Json(TokensResponse {
            message: "token refreshed",
            tokens,
        })),
        Err(AuthError::InvalidRefreshToken) => {
            log_security_event(
                events::REFRESH_REPLAY,
                None,
                client.ip_address.as_deref(),
                "Rejected refresh token (unknown, expired or already rotated)",
            );
            Err(AuthError::InvalidRefreshToken.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Revoke a refresh token.
///
/// Succeeds whether or not the token existed. A bearer access token, when
/// sent, is blacklisted as well if that layer is enabled.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<RefreshTokenPayload>,
) -> ApiResult<Json<MessageResponse>> {
    let token = payload.token()?;

    state.auth.logout(token, bearer_token(&headers)).await;

    Ok(message("logout successful"))
}

/// Current user's public profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<UserResponse>> {
    let profile = state.auth.me(&user.user_id).await?;
    Ok(Json(UserResponse { user: profile }))
}
