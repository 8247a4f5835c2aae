// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Storage
//!
//! The authentication core reads principals through the [`CredentialStore`]
//! trait and never depends on a concrete backend.
//!
//! ## Backends
//!
//! - [`InMemoryCredentialStore`] - process-local maps, used in tests and when
//!   `DATA_DIR` is unset
//! - [`RedbCredentialStore`] - embedded ACID database under `DATA_DIR`
//!
//! Lookups are synchronous. Async callers run them on the blocking pool.

pub mod credential_db;
pub mod memory;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Role;
use crate::frn::Frn;

pub use credential_db::RedbCredentialStore;
pub use memory::InMemoryCredentialStore;

/// A registered account as stored by the credential store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Globally unique identifier (`frn:<service>:user:<id>`)
    pub id: Frn,
    /// Login email, unique case-insensitively
    pub email: String,
    /// Name shown to other learners
    pub display_name: String,
    /// bcrypt hash of the password
    pub password_hash: String,
    /// Granted roles
    pub roles: BTreeSet<Role>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("password_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write access to registered principals.
pub trait CredentialStore: Send + Sync {
    /// Look up a principal by its FRN.
    fn find_by_principal_id(&self, id: &Frn) -> StoreResult<Option<Principal>>;

    /// Look up a principal by email (case-insensitive).
    fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>>;

    /// Insert a new principal.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the id or email is taken.
    fn insert(&self, principal: Principal) -> StoreResult<()>;

    /// All principals, oldest first.
    fn list(&self) -> StoreResult<Vec<Principal>>;
}

/// Normalized form used for email uniqueness.
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
