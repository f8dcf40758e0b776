//! Email verification handlers.

use axum::{Extension, Json, extract::State};
use chefshare::auth::{
    VerificationRequestOutcome, VerifyOutcome, verification::VERIFICATION_RESEND_MESSAGE,
};
use serde::Deserialize;

use super::{
    AppState, MessageResponse,
    error::{ApiJson, ApiResult},
    message,
    middleware::AuthUser,
    password_reset::EmailPayload,
};

const ALREADY_VERIFIED: &str = "email is already verified";

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub token: String,
}

/// Consume a verification token from the emailed link.
///
/// # Errors
///
/// - `400 Bad Request`: No token
/// - `404 Not Found`: Unknown or already used token
/// - `410 Gone`: Token expired; a new one must be requested
pub async fn confirm(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenPayload>,
) -> ApiResult<Json<MessageResponse>> {
    let outcome = state.auth.confirm_email_verification(&payload.token).await?;

    Ok(message(match outcome {
        VerifyOutcome::Verified => "email verified successfully",
        VerifyOutcome::AlreadyVerified => ALREADY_VERIFIED,
    }))
}

/// Unauthenticated resend. One generic answer for every well-formed email.
pub async fn resend(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailPayload>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.resend_verification(&payload.email).await?;
    Ok(message(VERIFICATION_RESEND_MESSAGE))
}

/// Authenticated request for a verification email.
///
/// # Errors
///
/// - `429 Too Many Requests`: Email gate exhausted
pub async fn request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MessageResponse>> {
    let outcome = state.auth.request_verification(&user.user_id).await?;

    Ok(message(match outcome {
        VerificationRequestOutcome::Sent => "verification email sent",
        VerificationRequestOutcome::AlreadyVerified => ALREADY_VERIFIED,
    }))
}
