// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token errors.
//!
//! These never reach the client directly: the authentication filter logs them
//! and lets the request continue anonymously.

use thiserror::Error;

use crate::error::ErrorCode;

/// Failure to issue or verify an access token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token is not a well-formed JWT, carries unexpected claims, or is too large.
    #[error("Token is malformed")]
    Malformed,

    /// Token signature does not verify with the configured key or algorithm.
    #[error("Token signature is invalid")]
    BadSignature,

    /// Token expiry is in the past.
    #[error("Token has expired")]
    Expired,

    /// Token could not be signed.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Error code reported for this failure.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            TokenError::Malformed => ErrorCode::TokenMalformed,
            TokenError::BadSignature => ErrorCode::TokenSignatureInvalid,
            TokenError::Expired => ErrorCode::TokenExpired,
            TokenError::Signing(_) => ErrorCode::InternalError,
        }
    }

    /// Short machine-readable label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
            TokenError::Signing(_) => "signing_failed",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}
