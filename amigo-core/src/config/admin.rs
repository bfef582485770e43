//! Admin credential configuration.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Prefix of every PHC-formatted argon2 hash.
const ARGON2_PREFIX: &str = "$argon2";

/// The admin secret, stored only as an argon2 hash.
#[derive(Clone)]
pub struct AdminConfig {
    secret_hash: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig").finish_non_exhaustive()
    }
}

impl AdminConfig {
    /// Wrap an existing argon2 hash.
    pub fn from_hash(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Hash a plaintext secret with a fresh salt.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, argon2::password_hash::Error> {
        hash_secret(plaintext).map(Self::from_hash)
    }

    /// Whether a configured secret is already an argon2 hash.
    pub fn is_hashed(secret: &str) -> bool {
        secret.starts_with(ARGON2_PREFIX)
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    /// Check a plaintext credential. A malformed stored hash never matches.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a plaintext secret into PHC string format.
pub fn hash_secret(plaintext: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}
