//! Password reset by emailed one-time code.

use super::{
    errors::{AuthError, AuthResult},
    models::PasswordResetConfirm,
    service::AuthService,
    validation,
};
use crate::{
    db::{reset_codes, unit_of_work::UnitOfWork, users},
    notify::Notification,
};
use chrono::Utc;

/// Response to every reset request, whether or not the email is registered.
pub const RESET_REQUESTED_MESSAGE: &str =
    "if your email is registered, we've sent a password reset code";

/// Response to every resend, whether or not the email is registered.
pub const RESET_RESENT_MESSAGE: &str =
    "if your email is registered, we've sent a new password reset code";

pub const RESET_RATE_LIMITED_MESSAGE: &str =
    "too many password reset attempts, please try again later";

impl AuthService {
    /// Start a password reset.
    ///
    /// Rate-limited, unknown and known emails are indistinguishable to the
    /// caller: each returns `Ok(())`. Only a malformed email or an internal
    /// failure is reported.
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        self.issue_reset_code(email).await
    }

    /// Send a fresh code, invalidating any earlier one. Same posture as
    /// [`request_password_reset`](Self::request_password_reset).
    pub async fn resend_password_reset(&self, email: &str) -> AuthResult<()> {
        self.issue_reset_code(email).await
    }

    async fn issue_reset_code(&self, email: &str) -> AuthResult<()> {
        let email = validation::normalize_email(email);
        validation::validate_email(&email)?;

        if !self.email_limiter.allow(&email) {
            log::warn!("Password reset rate limit hit for {}", email);
            return Ok(());
        }

        let mut uow = UnitOfWork::begin(&self.pool).await?;

        let Some(user) = users::find_by_email(&mut uow, &email).await? else {
            log::info!("Password reset requested for unregistered email {}", email);
            return Ok(());
        };

        let code = reset_codes::create(&mut uow, &user.user_id, self.config.otp_ttl).await?;
        uow.commit().await?;

        log::info!("Issued password reset code for user {}", user.user_id);

        self.notifications.submit(Notification::PasswordReset {
            email: user.email.clone(),
            name: user.display_name().to_string(),
            code: code.code,
        });

        Ok(())
    }

    /// Finish a password reset.
    ///
    /// The new digest and consumption of the code commit together. Every
    /// refresh token of the user is then revoked; a failure there is logged
    /// and does not undo the reset.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Malformed email or OTP, weak password
    /// * `AuthError::RateLimited` - Too many attempts for this email
    /// * `AuthError::UserNotFound` - No account for this email
    /// * `AuthError::InvalidOrExpiredOtp` - Wrong, used or expired code
    pub async fn confirm_password_reset(&self, request: PasswordResetConfirm) -> AuthResult<()> {
        let email = validation::normalize_email(&request.email);
        let otp = request.otp.trim();

        validation::validate_email(&email)?;
        validation::validate_otp_format(otp)?;
        validation::validate_password(&request.password)?;

        if !self.email_limiter.allow(&email) {
            return Err(AuthError::RateLimited(RESET_RATE_LIMITED_MESSAGE.to_string()));
        }

        let user = {
            let mut conn = self.pool.acquire().await?;
            let user = users::find_by_email(&mut conn, &email)
                .await?
                .ok_or(AuthError::UserNotFound)?;
            reset_codes::find_by_code(&mut conn, &user.user_id, otp)
                .await?
                .filter(|code| code.is_live(Utc::now()))
                .ok_or(AuthError::InvalidOrExpiredOtp)?;
            user
        };

        // Hashing holds no connection or lock; the code is re-checked below.
        let digest = self.hasher.hash(&request.password)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        users::lock_by_id(&mut uow, &user.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let code = reset_codes::find_by_code(&mut uow, &user.user_id, otp)
            .await?
            .filter(|code| code.is_live(Utc::now()))
            .ok_or(AuthError::InvalidOrExpiredOtp)?;

        users::update_password_hash(&mut uow, &user.user_id, &digest).await?;
        reset_codes::mark_used(&mut uow, code.id).await?;
        uow.commit().await?;

        match self.pool.acquire().await {
            Ok(mut conn) => match self.tokens.revoke_all_for_user(&mut conn, &user.user_id).await {
                Ok(count) => log::info!(
                    "Password reset for user {}, {} sessions revoked",
                    user.user_id,
                    count
                ),
                Err(e) => log::error!(
                    "Password reset for user {} but session revocation failed: {}",
                    user.user_id,
                    e
                ),
            },
            Err(e) => log::error!(
                "Password reset for user {} but session revocation failed: {}",
                user.user_id,
                e
            ),
        }

        self.notifications.submit(Notification::PasswordChanged {
            email: user.email.clone(),
            name: user.display_name().to_string(),
        });

        Ok(())
    }
}
