// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};

use super::run_blocking;
use crate::auth::{AdminOnly, Authenticated, Role};
use crate::error::{ApiError, ErrorBody};
use crate::frn::Frn;
use crate::models::{UserListResponse, UserResponse};
use crate::state::AppState;
use crate::storage::Principal;

async fn find_principal(state: &AppState, id: Frn) -> Result<Principal, ApiError> {
    let store = state.store.clone();
    run_blocking(move || {
        store
            .find_by_principal_id(&id)?
            .ok_or_else(|| ApiError::principal_not_found(id.to_string()))
    })
    .await
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> Result<Json<UserResponse>, ApiError> {
    let principal = find_principal(&state, ctx.principal_id).await?;
    Ok(Json(principal.into()))
}

/// Get a user by principal id.
///
/// Callers may read their own record; admins may read any.
#[utoipa::path(
    get,
    path = "/v1/users/{principal_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(
        ("principal_id" = String, Path, description = "Principal FRN, e.g. frn:flashdash:user:abc123")
    ),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 400, description = "Not a principal identifier", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not the caller and caller is not admin", body = ErrorBody),
        (status = 404, description = "Unknown principal", body = ErrorBody),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    principal_id: Result<Path<String>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Path(principal_id) = principal_id?;
    let id: Frn = principal_id
        .parse()
        .map_err(|e| ApiError::bad_request(format!("invalid principal id: {e}")))?;

    if id != ctx.principal_id && !ctx.has_role(Role::Admin) {
        tracing::warn!(
            principal_id = %ctx.principal_id,
            requested = %id,
            "Access to another principal denied"
        );
        return Err(ApiError::forbidden());
    }

    let principal = find_principal(&state, id).await?;
    Ok(Json(principal.into()))
}

/// List all registered principals (admin only).
#[utoipa::path(
    get,
    path = "/v1/admin/users",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All principals, oldest first", body = UserListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not admin", body = ErrorBody),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminOnly(ctx): AdminOnly,
) -> Result<Json<UserListResponse>, ApiError> {
    let store = state.store.clone();
    let principals = run_blocking(move || Ok(store.list()?)).await?;

    tracing::info!(principal_id = %ctx.principal_id, count = principals.len(), "Admin listed principals");

    let users: Vec<UserResponse> = principals.into_iter().map(UserResponse::from).collect();
    Ok(Json(UserListResponse {
        total: users.len(),
        users,
    }))
}
