// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing (bcrypt).

use thiserror::Error;

/// Production bcrypt cost factor (~200ms per hash).
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest cost bcrypt accepts; only suitable for tests.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Hash verified when the email is unknown, so both paths cost the same.
const DUMMY_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Password verification failed: {0}")]
    Verify(String),
}

/// Hash a plaintext password.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored hash.
///
/// With `hash = None` a dummy hash is checked and `false` is returned.
pub fn verify_password(password: &str, hash: Option<&str>) -> Result<bool, PasswordError> {
    match hash {
        Some(hash) => bcrypt::verify(password, hash).map_err(|e| PasswordError::Verify(e.to_string())),
        None => {
            let _ = bcrypt::verify(password, DUMMY_HASH);
            Ok(false)
        }
    }
}
