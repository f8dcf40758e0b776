//! Password reset by emailed one-time code.
//!
//! All three routes sit behind the per-IP gate. Request and resend answer the
//! same way for registered and unknown addresses.

use axum::{Json, extract::State};
use chefshare::auth::{
    AuthError, PasswordResetConfirm,
    reset::{RESET_REQUESTED_MESSAGE, RESET_RESENT_MESSAGE},
    validation::normalize_email,
};
use serde::{Deserialize, Serialize};

use super::{
    AppState, MessageResponse,
    client::ClientMeta,
    error::{ApiJson, ApiResult},
    message,
};
use crate::logging::{events, log_security_event};

#[derive(Debug, Deserialize)]
pub struct EmailPayload {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetCompletedResponse {
    pub message: &'static str,
    pub sessions_revoked: bool,
    pub info: &'static str,
}

/// Send a reset code if the address is registered.
///
/// # Response
///
/// Always `200 OK` with the same message for well-formed input.
pub async fn request(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailPayload>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.request_password_reset(&payload.email).await?;
    Ok(message(RESET_REQUESTED_MESSAGE))
}

/// Replace any outstanding code with a fresh one.
pub async fn resend(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailPayload>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.resend_password_reset(&payload.email).await?;
    Ok(message(RESET_RESENT_MESSAGE))
}

/// Set a new password with a valid code.
///
/// # Request Body
///
/// ```json
/// { "email": "cook@example.com", "otp": "123456", "password": "N3w&password" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed input, or `invalid or expired OTP`
/// - `404 Not Found`: No user with that email
/// - `429 Too Many Requests`: Email gate exhausted
pub async fn confirm(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    ApiJson(payload): ApiJson<PasswordResetConfirm>,
) -> ApiResult<Json<ResetCompletedResponse>> {
    let email = normalize_email(&payload.email);

    match state.auth.confirm_password_reset(payload).await {
        Ok(()) => {
            log_security_event(
                events::PASSWORD_RESET_COMPLETED,
                None,
                client.ip_address.as_deref(),
                &format!("Password reset completed for {}", email),
            );
            Ok(Json(ResetCompletedResponse {
                message: "password reset successful",
                sessions_revoked: true,
                info: "all active sessions have been signed out, please log in again",
            }))
        }
        Err(AuthError::RateLimited(msg)) => {
            log_security_event(
                events::RATE_LIMITED,
                None,
                client.ip_address.as_deref(),
                &format!("Reset confirm refused for {}", email),
            );
            Err(AuthError::RateLimited(msg).into())
        }
        Err(e) => Err(e.into()),
    }
}
