// SPDX-License-Identifier: MIT

//! Password hashing with Argon2id.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool
//! instead of the async request path.

use crate::error::AppError;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a password with Argon2id and a fresh random salt.
///
/// Returns the PHC-format string, which embeds the salt and parameters.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing task panicked: {}", e)))?
}

/// Verify a password against a stored PHC hash.
///
/// The underlying comparison is the argon2 crate's constant-time check.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash is malformed: {}", e)))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "password verification failed: {}",
                e
            ))),
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("verification task panicked: {}", e)))?
}

/// Burn one Argon2 computation without checking anything.
///
/// Called on the unknown-email login path so its latency matches the
/// wrong-password path and a caller cannot time which emails exist.
pub async fn dummy_verify(password: &str) {
    let _ = hash_password(password).await;
}
