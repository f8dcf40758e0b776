//! Token service: access-token validation and refresh-token lifecycle.

use super::{
    codes,
    errors::{AuthError, AuthResult},
    jwt::AccessTokenCodec,
    models::{AccessTokenClaims, ClientInfo, SessionTokens, User},
};
use crate::db::{blacklist, refresh_tokens, unit_of_work::UnitOfWork, users};
use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};

/// Blacklist lifetime for a token whose expiry cannot be recovered.
pub const DEFAULT_BLACKLIST_TTL_HOURS: i64 = 24;

/// Token service configuration
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret for access tokens
    pub secret: String,
    /// `iss` claim written and required
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Check and write the access-token blacklist
    pub blacklist_enabled: bool,
}

impl TokenConfig {
    /// 15 minute access tokens, 7 day refresh tokens, blacklist on.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "chefshare_api".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            blacklist_enabled: true,
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("blacklist_enabled", &self.blacklist_enabled)
            .finish_non_exhaustive()
    }
}

/// Mints, validates, rotates and revokes session tokens.
///
/// Refresh tokens are revoked by deleting their row. The blacklist is an
/// optional layer for killing an access token before its natural expiry.
#[derive(Debug, Clone)]
pub struct TokenService {
    pool: PgPool,
    codec: AccessTokenCodec,
    refresh_ttl: Duration,
    blacklist_enabled: bool,
}

impl TokenService {
    pub fn new(pool: PgPool, config: &TokenConfig) -> Self {
        Self {
            pool,
            codec: AccessTokenCodec::new(
                config.secret.as_bytes(),
                config.issuer.clone(),
                config.access_ttl,
            ),
            refresh_ttl: config.refresh_ttl,
            blacklist_enabled: config.blacklist_enabled,
        }
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    pub fn blacklist_enabled(&self) -> bool {
        self.blacklist_enabled
    }

    /// Sign a fresh access token for `user`. No I/O.
    pub fn mint_access_token(&self, user: &User) -> AuthResult<String> {
        self.codec.mint(user)
    }

    /// Validate a bearer token.
    ///
    /// The blacklist is consulted first when enabled. A failed lookup is
    /// logged and validation carries on with the signature checks.
    ///
    /// # Errors
    ///
    /// * `AuthError::TokenRevoked` - Token was blacklisted
    /// * `AuthError::InvalidToken` - Bad signature, algorithm, issuer, or expired
    pub async fn validate_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        if self.blacklist_enabled {
            match self.is_blacklisted(token).await {
                Ok(true) => return Err(AuthError::TokenRevoked),
                Ok(false) => {}
                Err(e) => log::warn!("Blacklist lookup failed, continuing validation: {}", e),
            }
        }

        self.codec.decode(token)
    }

    async fn is_blacklisted(&self, token: &str) -> AuthResult<bool> {
        let mut conn = self.pool.acquire().await?;
        blacklist::contains(&mut conn, &codes::fingerprint(token)).await
    }

    /// Mint an access token and persist a new refresh token.
    ///
    /// Takes a connection so it can run inside a caller's [`UnitOfWork`];
    /// the refresh row then commits or rolls back with everything else.
    pub async fn issue_token_pair(
        &self,
        conn: &mut PgConnection,
        user: &User,
        client: &ClientInfo,
    ) -> AuthResult<SessionTokens> {
        let access_token = self.mint_access_token(user)?;
        let refresh_token = codes::generate_refresh_token()?;

        refresh_tokens::insert(
            conn,
            &user.user_id,
            &refresh_token,
            Utc::now() + self.refresh_ttl,
            client,
        )
        .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The old row is consumed and the replacement inserted in one
    /// transaction, so a failure part way leaves the old token usable. Of two
    /// concurrent calls with the same token exactly one succeeds.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidRefreshToken` - Unknown, expired or already rotated
    /// * `AuthError::UserNotFound` - Owner no longer exists
    pub async fn rotate_on_refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;

        let old = refresh_tokens::take_live(&mut uow, refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let user = users::find_by_id(&mut uow, &old.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let tokens = self
            .issue_token_pair(&mut uow, &user, &old.client_info())
            .await?;

        uow.commit().await?;

        log::debug!("Rotated refresh token for user {}", user.user_id);
        Ok(tokens)
    }

    /// Delete one refresh token.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidRefreshToken` - No such token (callers may ignore)
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> AuthResult<()> {
        let mut conn = self.pool.acquire().await?;
        if refresh_tokens::delete(&mut conn, refresh_token).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidRefreshToken)
        }
    }

    /// Delete every refresh token the user holds. Returns how many went.
    pub async fn revoke_all_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: &str,
    ) -> AuthResult<u64> {
        refresh_tokens::delete_all_for_user(conn, user_id).await
    }

    /// Blacklist an access token until its own expiry.
    ///
    /// A token whose expiry cannot be recovered is still blacklisted, for
    /// [`DEFAULT_BLACKLIST_TTL_HOURS`].
    pub async fn blacklist_access_token(&self, token: &str) -> AuthResult<()> {
        let expires_at = self
            .codec
            .decode_expiry(token)
            .unwrap_or_else(|| Utc::now() + Duration::hours(DEFAULT_BLACKLIST_TTL_HOURS));
        let user_id = self.codec.decode(token).ok().map(|claims| claims.user_id);

        let mut conn = self.pool.acquire().await?;
        blacklist::insert(
            &mut conn,
            &codes::fingerprint(token),
            user_id.as_deref(),
            expires_at,
        )
        .await
    }
}
