//! Account updates for the signed-in user.

use axum::{Extension, Json, extract::State};
use chefshare::auth::{PasswordChange, ProfileOutcome, ProfileUpdate, UserProfile};
use serde::Serialize;

use super::{
    AppState,
    client::ClientMeta,
    error::{ApiJson, ApiResult},
    middleware::AuthUser,
};
use crate::logging::{events, log_security_event};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct PasswordUpdatedResponse {
    pub message: &'static str,
    pub sessions_revoked: bool,
}

/// Sparse profile update. Omitted fields are left alone.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed username or picture URL
/// - `409 Conflict`: Username taken by another account
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<ProfileResponse>> {
    let response = match state.auth.update_profile(&user.user_id, update).await? {
        ProfileOutcome::Updated(profile) => ProfileResponse {
            message: "profile updated successfully",
            user: profile,
        },
        ProfileOutcome::Unchanged(profile) => ProfileResponse {
            message: "no changes to update",
            user: profile,
        },
    };

    Ok(Json(response))
}

/// Change password; every refresh token of the account is revoked.
///
/// # Errors
///
/// - `401 Unauthorized`: `invalid current password`
/// - `400 Bad Request`: Weak password, or same as the current one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ClientMeta(client): ClientMeta,
    ApiJson(request): ApiJson<PasswordChange>,
) -> ApiResult<Json<PasswordUpdatedResponse>> {
    state.auth.change_password(&user.user_id, request).await?;

    log_security_event(
        events::PASSWORD_CHANGED,
        Some(&user.user_id),
        client.ip_address.as_deref(),
        "Password changed, sessions revoked",
    );

    Ok(Json(PasswordUpdatedResponse {
        message: "password updated successfully",
        sessions_revoked: true,
    }))
}
