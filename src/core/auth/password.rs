//! Password hashing
//!
//! bcrypt with a random per-hash salt. Hashing is CPU-bound, so both
//! operations run on tokio's blocking pool.
//!
//! bcrypt only reads the first 72 bytes of its input. The non-truncating
//! variants are used so that a longer password is an error instead of being
//! silently cut down to a prefix another password could share.

use bcrypt::BcryptError;

/// Longest password bcrypt can hash without truncation
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash a password using bcrypt with automatic salt generation
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_owned();
    let hash =
        tokio::task::spawn_blocking(move || bcrypt::non_truncating_hash(password, cost)).await??;
    Ok(hash)
}

/// Verify a password against a bcrypt hash.
///
/// The comparison inside bcrypt is constant-time. A password longer than
/// [`MAX_PASSWORD_BYTES`] can never have been hashed, so it does not match.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let result =
        tokio::task::spawn_blocking(move || bcrypt::non_truncating_verify(password, &hash)).await?;

    match result {
        Ok(valid) => Ok(valid),
        Err(BcryptError::Truncation(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
