// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory credential store.
//!
//! Accounts live only as long as the process.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{email_key, CredentialStore, Principal, StoreError, StoreResult};
use crate::frn::Frn;

#[derive(Default)]
struct Inner {
    principals: HashMap<Frn, Principal>,
    /// Normalized email → principal id
    email_index: HashMap<String, Frn>,
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("credential store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("credential store lock poisoned".to_string()))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_principal_id(&self, id: &Frn) -> StoreResult<Option<Principal>> {
        Ok(self.read()?.principals.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>> {
        let inner = self.read()?;
        Ok(inner
            .email_index
            .get(&email_key(email))
            .and_then(|id| inner.principals.get(id))
            .cloned())
    }

    fn insert(&self, principal: Principal) -> StoreResult<()> {
        let mut inner = self.write()?;
        let key = email_key(&principal.email);

        if inner.principals.contains_key(&principal.id) {
            return Err(StoreError::AlreadyExists(format!("Principal {}", principal.id)));
        }
        if inner.email_index.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!(
                "Principal with email {key}"
            )));
        }

        inner.email_index.insert(key, principal.id.clone());
        inner.principals.insert(principal.id.clone(), principal);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<Principal>> {
        let mut all: Vec<Principal> = self.read()?.principals.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
