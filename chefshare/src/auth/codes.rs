//! Random secrets: reset OTPs, verification tokens and refresh tokens.

use super::errors::{AuthError, AuthResult};
use base64::Engine;
use rand::{Rng, TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Bytes of entropy behind verification and refresh tokens.
pub const TOKEN_BYTES: usize = 32;

/// Uniform six-digit code in `100000..=999999`.
///
/// `rand::rng()` is a ChaCha-based CSPRNG seeded from the OS, and
/// `random_range` samples without modulo bias.
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    format!("{code:06}")
}

/// High-entropy URL-safe token for email verification links.
pub fn generate_verification_token() -> AuthResult<String> {
    random_url_safe(TOKEN_BYTES)
}

/// Opaque refresh token value.
pub fn generate_refresh_token() -> AuthResult<String> {
    random_url_safe(TOKEN_BYTES)
}

fn random_url_safe(len: usize) -> AuthResult<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| AuthError::Randomness)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// SHA-256 hex digest of a token, used as the blacklist key so raw bearer
/// tokens never sit in the database.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
