// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the request-scoped security context.

use std::collections::BTreeSet;
use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::roles::Role;
use crate::frn::Frn;
use crate::storage::Principal;

/// Claims carried by a FlashDash access token.
///
/// Tokens are stateless: validity depends only on the signature and `exp`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the principal's FRN.
    pub sub: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Resolved identity of the caller for the duration of one request.
///
/// The authentication filter inserts this into the request extensions after a
/// token has been verified against an existing principal. It is never shared
/// between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    /// Principal identifier (token subject)
    pub principal_id: Frn,
    /// Principal email, as stored
    pub email: String,
    /// Granted roles
    pub roles: BTreeSet<Role>,
    /// Remote peer address, when the server exposes connection info
    pub remote_addr: Option<SocketAddr>,
    /// Client session id (`x-session-id` header), if supplied
    pub session_id: Option<String>,
}

impl SecurityContext {
    /// Build a context for an authenticated principal.
    pub fn for_principal(
        principal: &Principal,
        remote_addr: Option<SocketAddr>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            principal_id: principal.id.clone(),
            email: principal.email.clone(),
            roles: principal.roles.clone(),
            remote_addr,
            session_id,
        }
    }

    /// Authority strings derived from the granted roles.
    pub fn authorities(&self) -> Vec<&'static str> {
        self.roles.iter().map(Role::authority).collect()
    }

    /// Check if any granted role satisfies the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.roles.iter().any(|r| r.has_privilege(required))
    }
}
