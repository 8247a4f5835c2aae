// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::auth::TokenManager;
use crate::config::{Config, DEFAULT_FRN_SERVICE, DEFAULT_PUBLIC_PATH_PREFIXES};
use crate::messages::{CatalogError, MessageCatalog};
use crate::storage::CredentialStore;

/// Request-pipeline settings that are fixed after startup.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Service segment of generated FRNs
    pub frn_service: String,
    /// Path prefixes that bypass the authorization gate
    pub public_path_prefixes: Vec<String>,
    /// bcrypt cost for new password hashes
    pub password_cost: u32,
}

impl AuthSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            frn_service: config.frn_service.clone(),
            public_path_prefixes: config.public_path_prefixes.clone(),
            password_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Whether `path` is exempt from authentication.
    ///
    /// Prefixes match whole path segments: `/health` covers `/health` and
    /// `/health/ready` but not `/healthz`. A prefix ending in `/` matches
    /// anything below it.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_path_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            frn_service: DEFAULT_FRN_SERVICE.to_string(),
            public_path_prefixes: DEFAULT_PUBLIC_PATH_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            password_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

/// Collaborators handed to every request.
///
/// All fields are read-only after startup; the credential store handles its
/// own synchronization.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenManager>,
    pub catalog: Arc<MessageCatalog>,
    pub settings: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenManager,
        catalog: MessageCatalog,
        settings: AuthSettings,
    ) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            catalog: Arc::new(catalog),
            settings: Arc::new(settings),
        }
    }

    /// Build the state from configuration and an opened store.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, CatalogError> {
        Ok(Self::new(
            store,
            TokenManager::from_config(config),
            MessageCatalog::load_embedded()?,
            AuthSettings::from_config(config),
        ))
    }
}
