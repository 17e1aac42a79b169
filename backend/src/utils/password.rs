//! Password hashing helpers.
//!
//! One-way hashing and verification of user passwords. The plaintext is
//! never logged or persisted.

use crate::errors::{ServiceError, ServiceResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// Hashes a password before storing it in the database.
///
/// # Errors
/// Returns `ServiceError::InternalError` if hashing fails; this is fatal to
/// the request.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {e}")))
}

/// Verifies a password against the stored hash.
///
/// A mismatch is a normal negative result (`Ok(false)`), not an error.
/// bcrypt compares digests in constant time.
pub fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    verify(password, hash)
        .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::OAUTH_PASSWORD_SENTINEL;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("secret1").expect("hashing should succeed");
        assert_ne!(hash, "secret1");
        assert!(verify_password("secret1", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("secret1").expect("hashing should succeed");
        assert!(!verify_password("secret2", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        // The OAuth sentinel is not a bcrypt digest; callers must check for
        // it before attempting verification.
        assert!(verify_password("anything", OAUTH_PASSWORD_SENTINEL).is_err());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert_ne!(a, b);
    }
}
