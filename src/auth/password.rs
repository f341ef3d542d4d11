//! Password hashing and verification using Argon2
//!
//! Uses argon2id variant with recommended parameters for password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::GatewayError;

/// One-way credential hashing as seen by the login flow
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plaintext credential for storage
    fn hash(&self, plaintext: &str) -> Result<String, GatewayError>;

    /// Check a plaintext credential against a stored hash
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, GatewayError>;
}

/// Argon2id-backed verifier
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, plaintext: &str) -> Result<String, GatewayError> {
        hash_password(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, GatewayError> {
        verify_password(plaintext, hash)
    }
}

/// Hash a password using Argon2id
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_password(password: &str) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GatewayError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
///
/// Returns true if the password matches the hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, GatewayError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| GatewayError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
