//! Salted one-way password hashing with bcrypt.

use crate::config::BCRYPT_MAX_INPUT;
use crate::error::HashError;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
    max_length: usize,
}

impl PasswordHasher {
    /// `cost` is the bcrypt work factor (4..=31); `max_length` is capped at
    /// the 72 bytes bcrypt actually reads so no password is silently truncated.
    pub fn new(cost: u32, max_length: usize) -> Result<Self, HashError> {
        if !(4..=31).contains(&cost) {
            return Err(HashError::Failed(format!("bcrypt cost {} out of range", cost)));
        }
        Ok(Self {
            cost,
            max_length: max_length.min(BCRYPT_MAX_INPUT),
        })
    }

    /// Hashes `plaintext` with a fresh random salt. Output is a modular-crypt
    /// string (`$2b$<cost>$<salt+digest>`) carrying everything `verify` needs.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if plaintext.is_empty() {
            return Err(HashError::InvalidInput("password must not be empty".to_string()));
        }
        if plaintext.len() > self.max_length {
            return Err(HashError::InvalidInput(format!(
                "password must be at most {} bytes",
                self.max_length
            )));
        }

        bcrypt::hash(plaintext, self.cost).map_err(|e| HashError::Failed(e.to_string()))
    }

    /// Constant-time check of `plaintext` against a stored hash. Malformed
    /// hashes and oversized input are a mismatch, not an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        if plaintext.is_empty() || plaintext.len() > self.max_length {
            return false;
        }
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}
