//! Password value object.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use common::ProviderFault;

/// Hash verified when no account exists, so lookups cost the same either way
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$1oyZQ1yUvXyhHdHlRvVz0W7sEJv5mXhpW1k3vH2xgYk";

/// Argon2 password hash; never printed.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash `plain_text` after checking it is at least `min_length` characters.
    pub fn new(plain_text: &str, min_length: usize) -> Result<Self, ProviderFault> {
        if plain_text.chars().count() < min_length {
            return Err(ProviderFault::coded(
                "auth/weak-password",
                format!("Password should be at least {} characters", min_length),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| ProviderFault::unclassified(format!("Password hash failed: {}", e)))?;

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Wrap a stored hash
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Stand-in used to keep verification time constant for unknown accounts
    pub fn dummy() -> Self {
        Self::from_hash(DUMMY_HASH)
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = Password::new("SecurePassword123!", 8).unwrap();
        assert!(password.verify("SecurePassword123!"));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn test_restored_hash_verifies() {
        let hash = Password::new("TestPassword123", 8).unwrap().into_string();
        assert!(Password::from_hash(hash).verify("TestPassword123"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = Password::new("SamePassword123", 8).unwrap();
        let b = Password::new("SamePassword123", 8).unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_short_password_is_weak() {
        match Password::new("short", 8) {
            Err(ProviderFault::Coded { code, .. }) => assert_eq!(code, "auth/weak-password"),
            other => panic!("expected weak password, got {:?}", other),
        }
    }

    #[test]
    fn test_dummy_never_verifies() {
        assert!(!Password::dummy().verify("anything"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = Password::new("SecurePassword123!", 8).unwrap();
        assert!(!format!("{:?}", password).contains("argon2"));
    }
}
