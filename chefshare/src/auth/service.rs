//! Auth flow orchestrator: registration, login, sessions and account changes.
//!
//! Password reset and email verification flows live in the sibling `reset`
//! and `verification` modules as further `impl AuthService` blocks.

use super::{
    errors::{AuthError, AuthResult},
    models::{
        AuthSession, ClientInfo, LoginRequest, NewUser, PasswordChange, ProfileOutcome,
        ProfileUpdate, RegisterRequest, SessionTokens, User, UserProfile,
    },
    password::PasswordHasher,
    tokens::TokenService,
    validation,
};
use crate::{
    db::{unit_of_work::UnitOfWork, users},
    notify::{Notification, NotificationQueue},
    security::RateLimit,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

/// Lifetimes of the one-time codes the orchestrator issues.
#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// Password reset OTP lifetime
    pub otp_ttl: Duration,
    /// Email verification token lifetime
    pub verification_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::minutes(15),
            verification_ttl: Duration::hours(48),
        }
    }
}

/// Request-level authentication logic.
///
/// Composes the credential store, the [`TokenService`], the one-time code
/// ledgers, the per-email rate limiter and the notification queue. Cheap to
/// clone; every field is shared.
#[derive(Clone)]
pub struct AuthService {
    pub(super) pool: PgPool,
    pub(super) tokens: Arc<TokenService>,
    pub(super) hasher: Arc<dyn PasswordHasher>,
    pub(super) email_limiter: Arc<dyn RateLimit>,
    pub(super) notifications: NotificationQueue,
    pub(super) config: AuthConfig,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        tokens: Arc<TokenService>,
        hasher: Arc<dyn PasswordHasher>,
        email_limiter: Arc<dyn RateLimit>,
        notifications: NotificationQueue,
        config: AuthConfig,
    ) -> Self {
        Self {
            pool,
            tokens,
            hasher,
            email_limiter,
            notifications,
            config,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn config(&self) -> AuthConfig {
        self.config
    }

    /// Register a new user and open their first session.
    ///
    /// The user row and the first refresh token commit together. The
    /// verification email is issued afterwards in the background; a failure
    /// there is logged and does not affect the registration.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Username, email, password or picture URL malformed
    /// * `AuthError::UsernameTaken` - Username already exists (case-insensitive)
    /// * `AuthError::EmailTaken` - Email already exists
    pub async fn register(
        &self,
        request: RegisterRequest,
        client: &ClientInfo,
    ) -> AuthResult<AuthSession> {
        let username = request.username.trim().to_string();
        let email = validation::normalize_email(&request.email);

        validation::validate_username(&username)?;
        validation::validate_email(&email)?;
        validation::validate_password(&request.password)?;

        let profile_picture = trimmed(request.profile_picture);
        if !profile_picture.is_empty() {
            validation::validate_picture_url(&profile_picture)?;
        }

        let new_user = NewUser {
            username,
            email,
            password_hash: self.hasher.hash(&request.password)?,
            bio: trimmed(request.bio),
            first_name: trimmed(request.first_name),
            last_name: trimmed(request.last_name),
            profile_picture,
        };

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let user = users::create(&mut uow, &new_user).await?;
        let tokens = self.tokens.issue_token_pair(&mut uow, &user, client).await?;
        uow.commit().await?;

        log::info!("Registered user {} ({})", user.user_id, user.email);

        let service = self.clone();
        let pending = user.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send_verification(&pending).await {
                log::error!(
                    "Failed to issue verification email for user {}: {}",
                    pending.user_id,
                    e
                );
            }
        });

        Ok(AuthSession {
            user: user.profile(),
            tokens,
        })
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest, client: &ClientInfo) -> AuthResult<AuthSession> {
        let email = validation::normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let mut conn = self.pool.acquire().await?;

        let Some(mut user) = users::find_by_email(&mut conn, &email).await? else {
            log::info!("Login attempt for unknown email {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&user.password_hash, &request.password) {
            log::info!("Login with wrong password for user {}", user.user_id);
            return Err(AuthError::InvalidCredentials);
        }

        match users::update_last_login(&mut conn, &user.user_id).await {
            Ok(()) => user.last_login = Some(Utc::now()),
            Err(e) => log::warn!("Failed to update last_login for {}: {}", user.user_id, e),
        }

        let tokens = self.tokens.issue_token_pair(&mut conn, &user, client).await?;

        Ok(AuthSession {
            user: user.profile(),
            tokens,
        })
    }

    /// Rotate a refresh token into a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidRefreshToken);
        }
        self.tokens.rotate_on_refresh(refresh_token).await
    }

    /// End a session. Always succeeds from the caller's point of view.
    ///
    /// The presented access token, if any, is blacklisted when the blacklist
    /// layer is enabled.
    pub async fn logout(&self, refresh_token: &str, access_token: Option<&str>) {
        match self.tokens.revoke_refresh_token(refresh_token).await {
            Ok(()) => {}
            Err(AuthError::InvalidRefreshToken) => {
                log::debug!("Logout with unknown refresh token");
            }
            Err(e) => log::warn!("Failed to revoke refresh token on logout: {}", e),
        }

        if let Some(token) = access_token {
            if self.tokens.blacklist_enabled() {
                if let Err(e) = self.tokens.blacklist_access_token(token).await {
                    log::warn!("Failed to blacklist access token on logout: {}", e);
                }
            }
        }
    }

    /// Profile of the authenticated user.
    pub async fn me(&self, user_id: &str) -> AuthResult<UserProfile> {
        Ok(self.load_user(user_id).await?.profile())
    }

    /// Apply a sparse profile update.
    ///
    /// Strings are trimmed; an empty `profile_picture` clears it. A new
    /// username is validated and checked against other users, with the unique
    /// index still deciding any race.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> AuthResult<ProfileOutcome> {
        let update = ProfileUpdate {
            username: update.username.map(|s| s.trim().to_string()),
            bio: update.bio.map(|s| s.trim().to_string()),
            first_name: update.first_name.map(|s| s.trim().to_string()),
            last_name: update.last_name.map(|s| s.trim().to_string()),
            profile_picture: update.profile_picture.map(|s| s.trim().to_string()),
        };

        if update.is_empty() {
            return Ok(ProfileOutcome::Unchanged(self.me(user_id).await?));
        }

        if let Some(picture) = update.profile_picture.as_deref() {
            if !picture.is_empty() {
                validation::validate_picture_url(picture)?;
            }
        }

        let mut conn = self.pool.acquire().await?;

        if let Some(username) = update.username.as_deref() {
            validation::validate_username(username)?;
            if users::is_username_taken(&mut conn, username, Some(user_id)).await? {
                return Err(AuthError::UsernameTaken);
            }
        }

        let user = users::update_profile(&mut conn, user_id, &update)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(ProfileOutcome::Updated(user.profile()))
    }

    /// Change password for an authenticated user.
    ///
    /// The new digest and the revocation of every refresh token commit
    /// together, forcing re-authentication on all devices.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCurrentPassword` - Current password wrong
    /// * `AuthError::Validation` - New password too weak
    /// * `AuthError::PasswordUnchanged` - New password equals the current one
    pub async fn change_password(&self, user_id: &str, request: PasswordChange) -> AuthResult<()> {
        let user = self.load_user(user_id).await?;

        if !self
            .hasher
            .verify(&user.password_hash, &request.current_password)
        {
            return Err(AuthError::InvalidCurrentPassword);
        }

        validation::validate_password(&request.new_password)?;
        if request.new_password == request.current_password {
            return Err(AuthError::PasswordUnchanged);
        }

        let digest = self.hasher.hash(&request.new_password)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        users::update_password_hash(&mut uow, &user.user_id, &digest).await?;
        let revoked = self
            .tokens
            .revoke_all_for_user(&mut uow, &user.user_id)
            .await?;
        uow.commit().await?;

        log::info!(
            "Password changed for user {}, {} sessions revoked",
            user.user_id,
            revoked
        );

        self.notifications.submit(Notification::PasswordChanged {
            email: user.email.clone(),
            name: user.display_name().to_string(),
        });

        Ok(())
    }

    pub(super) async fn load_user(&self, user_id: &str) -> AuthResult<User> {
        let mut conn = self.pool.acquire().await?;
        users::find_by_id(&mut conn, user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_code_lifetimes() {
        let config = AuthConfig::default();
        assert_eq!(config.otp_ttl, Duration::minutes(15));
        assert_eq!(config.verification_ttl, Duration::hours(48));
    }

    #[test]
    fn test_trimmed_optional_fields() {
        assert_eq!(trimmed(None), "");
        assert_eq!(trimmed(Some("  Home cook ".to_string())), "Home cook");
    }
}
