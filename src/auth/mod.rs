// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the FlashDash API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in via `POST /v1/auth/login` and receives a signed JWT
//! 2. Client sends `Authorization: Bearer <token>` on every request
//! 3. The authentication filter ([`middleware::authenticate`]):
//!    - verifies signature and expiry
//!    - loads the principal named by `sub` from the credential store
//!    - stores a [`SecurityContext`] in the request extensions
//! 4. The authorization gate ([`middleware::authorize`]) rejects anonymous
//!    requests to non-public paths; handlers use the extractors for roles
//!
//! ## Security
//!
//! - The filter never rejects; failed authentication leaves the request anonymous
//! - No server-side sessions, revocation list or refresh tokens
//! - Expiry is enforced without clock-skew leeway

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod token;

pub use claims::{SecurityContext, TokenClaims};
pub use error::TokenError;
pub use extractor::{AdminOnly, Authenticated, OptionalAuth};
pub use roles::Role;
pub use token::{IssuedToken, TokenManager};
