// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Startup helpers: credential store selection and the seeded admin account.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::auth::password::{hash_password, PasswordError};
use crate::auth::Role;
use crate::config::{Config, SeedAdmin};
use crate::frn::{Frn, ResourceType};
use crate::storage::{
    credential_db::CredentialDbError, CredentialStore, InMemoryCredentialStore, Principal,
    RedbCredentialStore, StoreError,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to open credential database: {0}")]
    Database(#[from] CredentialDbError),

    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Open the redb store under `DATA_DIR`, or an in-memory store without one.
pub fn open_store(config: &Config) -> Result<Arc<dyn CredentialStore>, BootstrapError> {
    match &config.data_dir {
        Some(dir) => {
            let store = RedbCredentialStore::open_in_dir(dir)?;
            tracing::info!(data_dir = %dir.display(), "Using redb credential store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATA_DIR not set; principals are kept in memory only");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
    }
}

/// Create the admin account unless its email is already registered.
///
/// Returns the id of the created principal, or `None` if it already existed.
pub fn seed_admin(
    store: &dyn CredentialStore,
    seed: &SeedAdmin,
    frn_service: &str,
    password_cost: u32,
) -> Result<Option<Frn>, BootstrapError> {
    if let Some(existing) = store.find_by_email(&seed.email)? {
        tracing::info!(principal_id = %existing.id, "Admin account already present");
        return Ok(None);
    }

    let principal = Principal {
        id: Frn::generate(frn_service, ResourceType::User),
        email: seed.email.trim().to_string(),
        display_name: "Administrator".to_string(),
        password_hash: hash_password(&seed.password, password_cost)?,
        roles: BTreeSet::from([Role::Admin, Role::User]),
        created_at: Utc::now(),
    };
    let id = principal.id.clone();
    store.insert(principal)?;

    tracing::info!(principal_id = %id, "Seeded admin account");
    Ok(Some(id))
}
