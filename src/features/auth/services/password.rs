//! Argon2id password hashing. Hashing is CPU-bound, so the async entry points run on the
//! blocking thread pool.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::core::error::{AppError, Result};

fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

pub async fn verify_password(password: String, stored_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_and_verifiable() {
        let first = hash("hunter22").unwrap();
        let second = hash("hunter22").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify("hunter22", &first));
        assert!(!verify("hunter23", &first));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify("anything", "plaintext-password"));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let stored = hash_password("s3cret".to_string()).await.unwrap();
        assert!(verify_password("s3cret".to_string(), stored.clone())
            .await
            .unwrap());
        assert!(!verify_password("nope".to_string(), stored).await.unwrap());
    }
}
