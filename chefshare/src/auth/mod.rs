//! Authentication and session lifecycle.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - HMAC-signed JWT access tokens (15-minute expiry)
//! - Rotating, single-use refresh tokens (7-day expiry)
//! - An optional blacklist for revoking access tokens early
//! - Password reset by six-digit one-time code
//! - Email verification by high-entropy link token
//!
//! ## Example
//!
//! ```no_run
//! use chefshare::auth::{
//!     Argon2Hasher, AuthConfig, AuthService, ClientInfo, RegisterRequest, TokenConfig,
//!     TokenService,
//! };
//! use chefshare::db::Database;
//! use chefshare::notify::{LogNotifier, NotificationQueue};
//! use chefshare::security::{RateLimitConfig, SlidingWindowLimiter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let tokens = Arc::new(TokenService::new(
//!         db.pool().clone(),
//!         &TokenConfig::new("a-signing-secret-of-at-least-32-chars"),
//!     ));
//!     let (queue, _worker) = NotificationQueue::start(Arc::new(LogNotifier));
//!     let auth = AuthService::new(
//!         db.pool().clone(),
//!         tokens,
//!         Arc::new(Argon2Hasher::new("pepper-value-here")),
//!         Arc::new(SlidingWindowLimiter::new(RateLimitConfig::per_email())),
//!         queue,
//!         AuthConfig::default(),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: "alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!         password: "Passw0rd!".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let session = auth.register(request, &ClientInfo::default()).await?;
//!     println!("Registered user: {}", session.user.username);
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod password;
pub mod reset;
pub mod service;
pub mod tokens;
pub mod validation;
pub mod verification;

pub use errors::{AuthError, AuthResult, ErrorKind};
pub use jwt::AccessTokenCodec;
pub use models::{
    AccessTokenClaims, AuthSession, ClientInfo, LoginRequest, PasswordChange,
    PasswordResetConfirm, ProfileOutcome, ProfileUpdate, RegisterRequest, SessionTokens, User,
    UserId, UserProfile, VerificationRequestOutcome, VerifyOutcome,
};
pub use password::{Argon2Hasher, PasswordHasher};
pub use service::{AuthConfig, AuthService};
pub use tokens::{TokenConfig, TokenService};
