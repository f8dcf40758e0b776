//! Input rules for usernames, emails, passwords, profile URLs and OTPs.
//!
//! Every check returns [`AuthError::Validation`] with a message that is safe
//! to hand back to the client verbatim.

use super::errors::{AuthError, AuthResult};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const OTP_LEN: usize = 6;

/// Usernames nobody may register, compared case-insensitively.
pub const RESERVED_USERNAMES: [&str; 7] =
    ["admin", "root", "support", "null", "contact", "api", "system"];

/// Characters that satisfy the "one symbol" password rule.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()-_=+[]{}|;:',.<>?/`~";

pub const PASSWORD_RULE_MESSAGE: &str =
    "password must be at least 8 characters with a number and symbol";

const USERNAME_PATTERN: &str = r"^[a-zA-Z0-9]+(?:_[a-zA-Z0-9]+)*$";
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

// Literal patterns, covered by `test_patterns_compile`.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(USERNAME_PATTERN).expect("username pattern is valid"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"));

/// Validate username length, charset and reserved words.
///
/// Underscores are allowed only between alphanumeric runs, so `_chef`,
/// `chef_` and `chef__one` are all rejected.
pub fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AuthError::validation(
            "username must be between 3 and 20 characters",
        ));
    }

    if !USERNAME_RE.is_match(username) {
        return Err(AuthError::validation("invalid username format"));
    }

    if is_reserved_username(username) {
        return Err(AuthError::validation("username not allowed"));
    }

    Ok(())
}

/// True if `username` collides with a reserved word, ignoring case.
pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
}

/// Trim and lowercase an email for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check an already-normalized email against the accepted shape.
pub fn validate_email(email: &str) -> AuthResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::validation("invalid email format"))
    }
}

/// Password strength: minimum length, one ASCII digit, one listed symbol.
pub fn validate_password(password: &str) -> AuthResult<()> {
    let long_enough = password.chars().count() >= PASSWORD_MIN_LEN;
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if long_enough && has_digit && has_symbol {
        Ok(())
    } else {
        Err(AuthError::validation(PASSWORD_RULE_MESSAGE))
    }
}

/// Profile pictures must be absolute http(s) URLs with a host.
pub fn validate_picture_url(raw: &str) -> AuthResult<()> {
    let valid = Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(AuthError::validation("invalid profile picture URL"))
    }
}

/// Reset codes are exactly six ASCII digits.
pub fn validate_otp_format(otp: &str) -> AuthResult<()> {
    if otp.len() == OTP_LEN && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AuthError::validation("invalid OTP format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_patterns_compile() {
        assert!(Regex::new(USERNAME_PATTERN).is_ok());
        assert!(Regex::new(EMAIL_PATTERN).is_ok());
        assert!(USERNAME_RE.is_match("chef_42"));
        assert!(EMAIL_RE.is_match("alice@example.com"));
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("chef_42").is_ok());
        assert!(validate_username("a_b_c").is_ok());

        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("_chef").is_err());
        assert!(validate_username("chef_").is_err());
        assert!(validate_username("chef__one").is_err());
        assert!(validate_username("chef-one").is_err());
        assert!(validate_username("chéf").is_err());
    }

    #[test]
    fn test_reserved_usernames_any_case() {
        for name in ["admin", "ADMIN", "Root", "sUpPort", "api", "System"] {
            let err = validate_username(name).unwrap_err();
            assert_eq!(err.to_string(), "username not allowed", "{name}");
        }
        assert!(validate_username("admin1").is_ok());
    }

    #[test]
    fn test_length_message_checked_first() {
        let err = validate_username("a!").unwrap_err();
        assert_eq!(
            err.to_string(),
            "username must be between 3 and 20 characters"
        );
    }

    #[test]
    fn test_email_normalization_and_shape() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+tag@mail.example.co").is_ok());

        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("alice.example.com").is_err());
        assert!(validate_email("alice@example.c").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("12345678`").is_ok());

        assert!(validate_password("Pa0!").is_err());
        assert!(validate_password("Password!").is_err());
        assert!(validate_password("Password1").is_err());
        assert_eq!(
            validate_password("short").unwrap_err().to_string(),
            PASSWORD_RULE_MESSAGE
        );
    }

    #[test]
    fn test_picture_url() {
        assert!(validate_picture_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_picture_url("http://localhost/me.jpg").is_ok());

        assert!(validate_picture_url("not a url").is_err());
        assert!(validate_picture_url("ftp://example.com/a.png").is_err());
        assert!(validate_picture_url("/relative/path.png").is_err());
    }

    #[test]
    fn test_otp_format() {
        assert!(validate_otp_format("012345").is_ok());
        assert!(validate_otp_format("12345").is_err());
        assert!(validate_otp_format("1234567").is_err());
        assert!(validate_otp_format("12a456").is_err());
        assert!(validate_otp_format("１２３４５６").is_err());
    }

    proptest! {
        #[test]
        fn prop_well_formed_usernames_accepted(name in "[a-z][a-z0-9]{2,9}(_[a-z0-9]{1,4})?") {
            prop_assume!(!is_reserved_username(&name));
            prop_assert!(validate_username(&name).is_ok());
        }

        #[test]
        fn prop_passwords_without_digits_rejected(pw in "[a-zA-Z!@#]{8,32}") {
            prop_assert!(validate_password(&pw).is_err());
        }

        #[test]
        fn prop_normalize_is_idempotent(email in "[ ]{0,2}[A-Za-z0-9.]{1,10}@[A-Za-z]{1,8}\\.[A-Za-z]{2,4}[ ]{0,2}") {
            let once = normalize_email(&email);
            prop_assert_eq!(normalize_email(&once), once.clone());
            prop_assert!(validate_email(&once).is_ok());
        }
    }
}
