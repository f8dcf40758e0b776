//! Authentication error types.

use thiserror::Error;

/// Constraint backing case-insensitive username uniqueness.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Constraint backing email uniqueness.
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Coarse classification of an [`AuthError`], one per response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, safe to describe precisely.
    Validation,
    /// Duplicate username or email.
    Conflict,
    /// Bad credentials or token. Messages stay generic.
    Unauthorized,
    /// Record absent where revealing that is acceptable.
    NotFound,
    /// A verification link that existed but expired.
    Gone,
    /// Admission control rejected the request.
    RateLimited,
    /// Store, signing or hashing failure.
    Internal,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Token signing failed (misconfigured key)
    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Random source failure
    #[error("Random source unavailable")]
    Randomness,

    /// Input failed a format or strength rule
    #[error("{0}")]
    Validation(String),

    /// Username already exists
    #[error("username already exists")]
    UsernameTaken,

    /// Email already exists
    #[error("email already exists")]
    EmailTaken,

    /// Some other unique constraint fired
    #[error("username or email already exists")]
    Conflict,

    /// Login failed, deliberately not saying which field was wrong
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Access token failed signature, expiry or format checks
    #[error("invalid or expired token")]
    InvalidToken,

    /// Access token was blacklisted before expiry
    #[error("invalid or expired token")]
    TokenRevoked,

    /// Refresh token missing, expired or already rotated
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// User record not found
    #[error("user not found")]
    UserNotFound,

    /// Wrong, expired or already used reset code
    #[error("invalid or expired OTP")]
    InvalidOrExpiredOtp,

    /// Verification token never existed (or was already consumed)
    #[error("invalid or expired verification token")]
    VerificationTokenNotFound,

    /// Verification token existed but expired
    #[error("verification link has expired, please request a new one")]
    VerificationTokenExpired,

    /// Password change with a wrong current password
    #[error("invalid current password")]
    InvalidCurrentPassword,

    /// Password change to the same password
    #[error("new password must be different from current password")]
    PasswordUnchanged,

    /// Refused by a rate limiter
    #[error("{0}")]
    RateLimited(String),
}

impl AuthError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }

    /// Classify this error into its response class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidOrExpiredOtp
            | AuthError::PasswordUnchanged => ErrorKind::Validation,
            AuthError::UsernameTaken | AuthError::EmailTaken | AuthError::Conflict => {
                ErrorKind::Conflict
            }
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenRevoked
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidCurrentPassword => ErrorKind::Unauthorized,
            AuthError::UserNotFound | AuthError::VerificationTokenNotFound => ErrorKind::NotFound,
            AuthError::VerificationTokenExpired => ErrorKind::Gone,
            AuthError::RateLimited(_) => ErrorKind::RateLimited,
            AuthError::Database(_)
            | AuthError::HashingFailed
            | AuthError::Signing(_)
            | AuthError::Randomness => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store, signing and hashing failures collapse to a generic message; the
    /// detail only ever reaches the server log.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Translate a unique-constraint violation into the matching conflict.
    ///
    /// Any other database error is passed through unchanged, so callers can
    /// use this directly in `map_err` after an insert or update.
    pub fn from_unique_violation(err: sqlx::Error) -> Self {
        let constraint = match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                db.constraint().map(str::to_owned)
            }
            _ => return AuthError::Database(err),
        };

        match constraint.as_deref() {
            Some(USERNAME_CONSTRAINT) => AuthError::UsernameTaken,
            Some(EMAIL_CONSTRAINT) => AuthError::EmailTaken,
            _ => AuthError::Conflict,
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
