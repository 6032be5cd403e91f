//! Refresh-secret generation, hashing, and verification.
//!
//! Refresh secrets are opaque 256-bit random values; only their Argon2id
//! hash is stored server-side so a database leak does not compromise active
//! sessions. The PHC string format embeds algorithm parameters and salt in
//! the hash itself.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use rand_core::OsRng;

use crate::error::AuthError;

/// Number of random bytes in a refresh secret.
const SECRET_LEN: usize = 32;

/// Hashes and verifies refresh secrets with Argon2id.
///
/// Verification is constant-time (argon2 compares full digests internally);
/// a mismatch is reported as `Ok(false)`, distinct from primitive failure,
/// because the engine revokes the session on mismatch.
#[derive(Default)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Generate a fresh refresh secret: 32 CSPRNG bytes, hex-encoded.
    pub fn generate_secret(&self) -> String {
        let mut bytes = [0u8; SECRET_LEN];
        rand::rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Hash a plaintext secret with a random salt, returning the PHC string.
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Crypto("refusing to hash empty secret".into()));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::Crypto(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext secret against a stored PHC hash.
    ///
    /// Returns `Ok(true)` on match, `Ok(false)` on mismatch, and `Err` only
    /// when the stored hash is unparseable or the primitive fails.
    pub fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Crypto(e.to_string()))?;
        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Crypto(e.to_string())),
        }
    }
}
