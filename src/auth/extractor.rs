// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the caller's security context.
//!
//! The authentication filter resolves the caller; these extractors only read
//! what it left in the request extensions.
//!
//! ```rust,ignore
//! async fn me(Authenticated(ctx): Authenticated) -> impl IntoResponse {
//!     // ctx is SecurityContext
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{Role, SecurityContext};
use crate::error::ApiError;

/// Extractor for authenticated callers.
///
/// Rejects with `Unauthenticated` when the filter did not attach a context.
pub struct Authenticated(pub SecurityContext);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub SecurityContext);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(ctx) = Authenticated::from_request_parts(parts, state).await?;

        if !ctx.has_role(Role::Admin) {
            tracing::warn!(principal_id = %ctx.principal_id, "Admin access denied");
            return Err(ApiError::forbidden());
        }

        Ok(AdminOnly(ctx))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` for anonymous callers instead of rejecting.
pub struct OptionalAuth(pub Option<SecurityContext>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<SecurityContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::storage::test_support::principal;
    use axum::http::Request;

    fn parts_with(context: Option<SecurityContext>) -> Parts {
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        if let Some(ctx) = context {
            parts.extensions.insert(ctx);
        }
        parts
    }

    fn context(roles: &[Role]) -> SecurityContext {
        SecurityContext::for_principal(&principal("ada@flashdash.io", roles), None, None)
    }

    #[tokio::test]
    async fn authenticated_requires_context() {
        let mut parts = parts_with(None);
        let result = Authenticated::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError { code: ErrorCode::Unauthenticated, .. })));
    }

    #[tokio::test]
    async fn authenticated_reads_context_from_extensions() {
        let ctx = context(&[Role::User]);
        let mut parts = parts_with(Some(ctx.clone()));
        let Authenticated(found) = Authenticated::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, ctx);
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let mut parts = parts_with(Some(context(&[Role::User])));
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError { code: ErrorCode::Forbidden, .. })));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let mut parts = parts_with(Some(context(&[Role::Admin])));
        assert!(AdminOnly::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn admin_only_without_context_is_unauthenticated() {
        let mut parts = parts_with(None);
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError { code: ErrorCode::Unauthenticated, .. })));
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_context() {
        let mut parts = parts_with(None);
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(found.is_none());
    }
}
