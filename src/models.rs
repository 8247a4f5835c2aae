// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for the OpenAPI document; JSON field names are camelCase.
//!
//! ## Model Categories
//!
//! - **Accounts**: registration and login requests
//! - **Users**: the public view of a principal (never includes the password hash)

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::error::ApiError;
use crate::storage::Principal;

/// Longest accepted email address.
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores input past 72 bytes.
pub const MAX_PASSWORD_LEN: usize = 72;
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

// =============================================================================
// Account Models
// =============================================================================

/// Request to create a new account.
#[derive(Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email; must be unused.
    pub email: String,
    /// Password, 8 to 72 bytes.
    pub password: String,
    /// Name shown to other learners.
    pub display_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;

        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request(format!(
                "password must be at least {MIN_PASSWORD_LEN} bytes"
            )));
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ApiError::bad_request(format!(
                "password must be at most {MAX_PASSWORD_LEN} bytes"
            )));
        }

        let name = self.display_name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("displayName is required"));
        }
        if name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(ApiError::bad_request(format!(
                "displayName must be at most {MAX_DISPLAY_NAME_LEN} characters"
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Request to exchange credentials for an access token.
#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::bad_request("email and password are required"));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::bad_request("email is empty or too long"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("email must not contain whitespace"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::bad_request("email must look like name@domain")),
    }
}

// =============================================================================
// User Models
// =============================================================================

/// Public view of a registered principal.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Principal identifier (`frn:flashdash:user:<id>`).
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl From<Principal> for UserResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id.to_string(),
            email: principal.email,
            display_name: principal.display_name,
            roles: principal.roles.into_iter().collect(),
            created_at: principal.created_at,
        }
    }
}

/// Response for the admin principal listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}
