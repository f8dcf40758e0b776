//! Email address verification.

use super::{
    errors::{AuthError, AuthResult},
    models::{User, VerificationRequestOutcome, VerifyOutcome},
    service::AuthService,
    validation,
};
use crate::{
    db::{unit_of_work::UnitOfWork, users, verification_tokens},
    notify::Notification,
};
use chrono::Utc;

/// Response to every unauthenticated resend.
pub const VERIFICATION_RESEND_MESSAGE: &str =
    "if your email is registered and not verified, a verification email will be sent";

pub const VERIFICATION_RATE_LIMITED_MESSAGE: &str =
    "too many verification attempts, please try again later";

impl AuthService {
    /// Consume a verification token.
    ///
    /// An expired token is deleted on sight and reported as expired, which is
    /// distinct from a token that never existed.
    ///
    /// # Errors
    ///
    /// * `AuthError::VerificationTokenNotFound` - Unknown or already used
    /// * `AuthError::VerificationTokenExpired` - Existed but expired
    pub async fn confirm_email_verification(&self, token: &str) -> AuthResult<VerifyOutcome> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::validation("token is required"));
        }

        let mut uow = UnitOfWork::begin(&self.pool).await?;

        let record = verification_tokens::find_by_token(&mut uow, token)
            .await?
            .ok_or(AuthError::VerificationTokenNotFound)?;

        if record.is_expired(Utc::now()) {
            verification_tokens::delete(&mut uow, record.id).await?;
            uow.commit().await?;
            return Err(AuthError::VerificationTokenExpired);
        }

        // User row before token row, the same order as token issuance.
        let user = users::lock_by_id(&mut uow, &record.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verification_tokens::delete(&mut uow, record.id).await? {
            return Err(AuthError::VerificationTokenNotFound);
        }

        if user.email_verified {
            uow.commit().await?;
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        users::set_email_verified(&mut uow, &user.user_id, true).await?;
        uow.commit().await?;

        log::info!("Email verified for user {}", user.user_id);

        self.notifications.submit(Notification::Welcome {
            email: user.email.clone(),
            name: user.display_name().to_string(),
        });

        Ok(VerifyOutcome::Verified)
    }

    /// Unauthenticated resend.
    ///
    /// Returns `Ok(())` for rate-limited, unknown and already verified
    /// addresses alike; only the last live case actually sends anything.
    pub async fn resend_verification(&self, email: &str) -> AuthResult<()> {
        let email = validation::normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::validation("email is required"));
        }
        validation::validate_email(&email)?;

        if !self.email_limiter.allow(&email) {
            log::warn!("Verification resend rate limit hit for {}", email);
            return Ok(());
        }

        let mut conn = self.pool.acquire().await?;
        let user = match users::find_by_email(&mut conn, &email).await? {
            Some(user) if !user.email_verified => user,
            Some(_) => {
                log::debug!("Verification resend for already verified {}", email);
                return Ok(());
            }
            None => {
                log::info!("Verification resend for unregistered email {}", email);
                return Ok(());
            }
        };
        drop(conn);

        self.send_verification(&user).await
    }

    /// Authenticated request for a (new) verification email.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - Authenticated user no longer exists
    /// * `AuthError::RateLimited` - Too many requests for this address
    pub async fn request_verification(
        &self,
        user_id: &str,
    ) -> AuthResult<VerificationRequestOutcome> {
        let user = self.load_user(user_id).await?;

        if user.email_verified {
            return Ok(VerificationRequestOutcome::AlreadyVerified);
        }

        if !self.email_limiter.allow(&user.email) {
            return Err(AuthError::RateLimited(
                VERIFICATION_RATE_LIMITED_MESSAGE.to_string(),
            ));
        }

        self.send_verification(&user).await?;
        Ok(VerificationRequestOutcome::Sent)
    }

    /// Replace the user's verification token and queue the email.
    pub(crate) async fn send_verification(&self, user: &User) -> AuthResult<()> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let token =
            verification_tokens::create(&mut uow, &user.user_id, self.config.verification_ttl)
                .await?;
        uow.commit().await?;

        self.notifications.submit(Notification::Verification {
            email: user.email.clone(),
            name: user.display_name().to_string(),
            token: token.token,
        });

        Ok(())
    }
}
