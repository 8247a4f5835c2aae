// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded credential database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `principals`: principal FRN → serialized [`Principal`] (JSON bytes)
//! - `email_index`: normalized email → principal FRN

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{email_key, CredentialStore, Principal, StoreError, StoreResult};
use crate::frn::Frn;

/// File name of the database inside `DATA_DIR`.
pub const CREDENTIAL_DB_FILE: &str = "credentials.redb";

const PRINCIPALS: TableDefinition<&str, &[u8]> = TableDefinition::new("principals");

const EMAIL_INDEX: TableDefinition<&str, &str> = TableDefinition::new("email_index");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CredentialDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

impl From<CredentialDbError> for StoreError {
    fn from(err: CredentialDbError) -> Self {
        match err {
            CredentialDbError::AlreadyExists(what) => StoreError::AlreadyExists(what),
            CredentialDbError::Serde(e) => StoreError::Serde(e),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

type DbResult<T> = Result<T, CredentialDbError>;

// =============================================================================
// RedbCredentialStore
// =============================================================================

pub struct RedbCredentialStore {
    db: Database,
}

impl RedbCredentialStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRINCIPALS)?;
            let _ = write_txn.open_table(EMAIL_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open the database file inside a data directory.
    pub fn open_in_dir(data_dir: &Path) -> DbResult<Self> {
        Self::open(&data_dir.join(CREDENTIAL_DB_FILE))
    }

    fn get(&self, id: &str) -> DbResult<Option<Principal>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRINCIPALS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_by_email(&self, email: &str) -> DbResult<Option<Principal>> {
        let key = email_key(email);
        let read_txn = self.db.begin_read()?;

        let index = read_txn.open_table(EMAIL_INDEX)?;
        let id = match index.get(key.as_str())? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let table = read_txn.open_table(PRINCIPALS)?;
        match table.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => {
                tracing::warn!(principal_id = %id, "Email index points at a missing principal");
                Ok(None)
            }
        }
    }

    fn put(&self, principal: &Principal) -> DbResult<()> {
        let json = serde_json::to_vec(principal)?;
        let id = principal.id.to_string();
        let key = email_key(&principal.email);

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PRINCIPALS)?;
            if table.get(id.as_str())?.is_some() {
                return Err(CredentialDbError::AlreadyExists(format!("Principal {id}")));
            }

            let mut index = write_txn.open_table(EMAIL_INDEX)?;
            if index.get(key.as_str())?.is_some() {
                return Err(CredentialDbError::AlreadyExists(format!(
                    "Principal with email {key}"
                )));
            }

            table.insert(id.as_str(), json.as_slice())?;
            index.insert(key.as_str(), id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn all(&self) -> DbResult<Vec<Principal>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRINCIPALS)?;

        let mut principals = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            principals.push(serde_json::from_slice::<Principal>(value.value())?);
        }
        principals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(principals)
    }
}

impl CredentialStore for RedbCredentialStore {
    fn find_by_principal_id(&self, id: &Frn) -> StoreResult<Option<Principal>> {
        Ok(self.get(&id.to_string())?)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>> {
        Ok(self.get_by_email(email)?)
    }

    fn insert(&self, principal: Principal) -> StoreResult<()> {
        Ok(self.put(&principal)?)
    }

    fn list(&self) -> StoreResult<Vec<Principal>> {
        Ok(self.all()?)
    }
}
