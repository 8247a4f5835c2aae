// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication filter and authorization gate.
//!
//! Both run as `axum::middleware::from_fn_with_state` layers, filter first:
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/v1/users/me", get(me))
//!     .layer(from_fn_with_state(state.clone(), authorize))
//!     .layer(from_fn_with_state(state.clone(), authenticate));
//! ```
//!
//! The filter only ever adds a [`SecurityContext`]; rejecting anonymous
//! requests is the gate's job.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{SecurityContext, TokenError};
use crate::error::ApiError;
use crate::frn::Frn;
use crate::state::AppState;
use crate::storage::Principal;

/// Header carrying the client's session id.
pub const SESSION_ID_HEADER: &str = "x-session-id";

const BEARER_SCHEME: &str = "Bearer";

/// Authentication filter.
///
/// Verifies a bearer token, if one is presented, and attaches the caller's
/// [`SecurityContext`] to the request. Never rejects: every failure is logged
/// and the request continues anonymously.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return next.run(request).await;
    };

    let principal_id = match state.tokens.extract_principal(&token) {
        Ok(id) => id,
        Err(err) => {
            log_token_failure(&err, request.uri().path());
            return next.run(request).await;
        }
    };

    if request.extensions().get::<SecurityContext>().is_some() {
        return next.run(request).await;
    }

    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let session_id = request
        .headers()
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    if let Some(principal) = load_principal(&state, principal_id).await {
        if state.tokens.validate(&token, &principal.id) {
            tracing::debug!(principal_id = %principal.id, "Request authenticated");
            let context = SecurityContext::for_principal(&principal, remote_addr, session_id);
            request.extensions_mut().insert(context);
        } else {
            tracing::warn!(principal_id = %principal.id, "Token does not validate for its principal");
        }
    }

    next.run(request).await
}

/// Authorization gate.
///
/// Lets public paths and authenticated requests through; everything else is
/// answered with `Unauthenticated`.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let allowed = state.settings.is_public(request.uri().path())
        || request.extensions().get::<SecurityContext>().is_some();

    if allowed {
        next.run(request).await
    } else {
        ApiError::unauthenticated().into_response()
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn log_token_failure(err: &TokenError, path: &str) {
    match err {
        TokenError::Expired => {
            tracing::warn!(reason = err.label(), path, "Rejected expired token")
        }
        TokenError::BadSignature => {
            tracing::error!(reason = err.label(), path, "Rejected token with invalid signature")
        }
        TokenError::Malformed | TokenError::Signing(_) => {
            tracing::warn!(reason = err.label(), path, "Rejected malformed token")
        }
    }
}

/// Look up the token subject on the blocking pool.
async fn load_principal(state: &AppState, principal_id: Frn) -> Option<Principal> {
    let store = state.store.clone();
    let lookup = principal_id.clone();

    match tokio::task::spawn_blocking(move || store.find_by_principal_id(&lookup)).await {
        Ok(Ok(Some(principal))) => Some(principal),
        Ok(Ok(None)) => {
            tracing::warn!(%principal_id, "Token names an unknown principal");
            None
        }
        Ok(Err(e)) => {
            tracing::error!(%principal_id, error = %e, "Credential store lookup failed");
            None
        }
        Err(e) => {
            tracing::error!(%principal_id, error = %e, "Credential store lookup task failed");
            None
        }
    }
}
