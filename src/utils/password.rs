use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::error;

use crate::utils::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Never fails: a malformed or non-bcrypt hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            error!("Error verifying password: {}", e);
            false
        }
    }
}

/// Stored hashes must be bcrypt output before we even attempt verification.
pub fn is_bcrypt_hash(hash: &str) -> bool {
    hash.starts_with("$2b$") || hash.starts_with("$2a$")
}
