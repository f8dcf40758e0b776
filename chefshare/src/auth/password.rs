//! Password hashing capability.

use super::errors::{AuthError, AuthResult};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

/// One-way password digests.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing digest of `plaintext`.
    fn hash(&self, plaintext: &str) -> AuthResult<String>;

    /// True only if `plaintext` produced `digest`. Malformed digests verify false.
    fn verify(&self, digest: &str, plaintext: &str) -> bool;
}

/// Argon2id with a per-hash random salt and a server-side pepper.
#[derive(Clone)]
pub struct Argon2Hasher {
    pepper: String,
}

impl Argon2Hasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
        }
    }

    fn peppered(&self, password: &str) -> String {
        format!("{}{}", password, self.pepper)
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(self.peppered(plaintext).as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        Argon2::default()
            .verify_password(self.peppered(plaintext).as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_then_verify() {
        let hasher = Argon2Hasher::new("pepper_for_tests");
        let digest = hasher.hash("Passw0rd!").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify(&digest, "Passw0rd!"));
        assert!(!hasher.verify(&digest, "Passw0rd?"));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = Argon2Hasher::new("pepper_for_tests");
        let a = hasher.hash("Passw0rd!").unwrap();
        let b = hasher.hash("Passw0rd!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_pepper_is_part_of_digest() {
        let digest = Argon2Hasher::new("pepper_one").hash("Passw0rd!").unwrap();
        assert!(!Argon2Hasher::new("pepper_two").verify(&digest, "Passw0rd!"));
    }

    #[test]
    fn test_malformed_digest_verifies_false() {
        let hasher = Argon2Hasher::new("pepper_for_tests");
        assert!(!hasher.verify("not-a-digest", "Passw0rd!"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn test_debug_hides_pepper() {
        let rendered = format!("{:?}", Argon2Hasher::new("super_secret_pepper"));
        assert!(!rendered.contains("super_secret_pepper"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(6))]

        #[test]
        fn prop_round_trip(password in "[ -~]{1,24}", other in "[ -~]{1,24}") {
            let hasher = Argon2Hasher::new("pepper_for_tests");
            let digest = hasher.hash(&password).unwrap();
            prop_assert!(hasher.verify(&digest, &password));
            if other != password {
                prop_assert!(!hasher.verify(&digest, &other));
            }
        }
    }
}
