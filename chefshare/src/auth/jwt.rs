//! Signed access tokens (HMAC JWTs).

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, User},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// HMAC algorithms a presented token may use. Anything else, including
/// `none` and asymmetric schemes, is rejected before signature checks.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Mints and decodes access tokens with a process-wide symmetric secret.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl AccessTokenCodec {
    /// Create a codec
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC signing secret
    /// * `issuer` - Value written to and required in the `iss` claim
    /// * `ttl` - Lifetime of minted tokens
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build and sign claims for `user`.
    ///
    /// # Errors
    ///
    /// * `AuthError::Signing` - Key misconfiguration; not a per-request failure
    pub fn mint(&self, user: &User) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
            sub: user.user_id.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    /// Verify signature, algorithm, issuer, `exp` and `nbf`.
    ///
    /// Every failure maps to `AuthError::InvalidToken`; expired and forged
    /// tokens are indistinguishable to the caller.
    pub fn decode(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Recover the expiry of a correctly signed token, ignoring whether it
    /// has already expired. `None` for anything that does not verify.
    pub fn decode_expiry(&self, token: &str) -> Option<DateTime<Utc>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation).ok()?;
        Utc.timestamp_opt(data.claims.exp, 0).single()
    }
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
