// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including other users' profiles and user listing
/// - `User` - Normal learner, can only access own resources
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal learner account
    User,
}

impl Role {
    /// Whether this role grants everything `required` grants.
    ///
    /// `Admin` grants every role; `User` grants only itself.
    pub fn has_privilege(&self, required: Role) -> bool {
        *self == Role::Admin || *self == required
    }

    /// Authority string granted by this role (e.g. `ROLE_ADMIN`).
    pub fn authority(&self) -> &'static str {
        match self {
            Role::Admin => "ROLE_ADMIN",
            Role::User => "ROLE_USER",
        }
    }
}
