// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account registration and login.

use std::collections::BTreeSet;

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::Utc;

use super::run_blocking;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{IssuedToken, Role};
use crate::error::{ApiError, ErrorBody};
use crate::frn::{Frn, ResourceType};
use crate::models::{LoginRequest, RegisterRequest, UserResponse};
use crate::state::AppState;
use crate::storage::Principal;

/// Register a new account with the `user` role.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let store = state.store.clone();
    let settings = state.settings.clone();

    let principal = run_blocking(move || {
        if store.find_by_email(&req.email)?.is_some() {
            return Err(ApiError::conflict("email already registered"));
        }

        let principal = Principal {
            id: Frn::generate(&settings.frn_service, ResourceType::User),
            email: req.email.trim().to_string(),
            display_name: req.display_name.trim().to_string(),
            password_hash: hash_password(&req.password, settings.password_cost)?,
            roles: BTreeSet::from([Role::User]),
            created_at: Utc::now(),
        };
        store.insert(principal.clone())?;
        Ok(principal)
    })
    .await?;

    tracing::info!(principal_id = %principal.id, "Principal registered");
    Ok((StatusCode::CREATED, Json(principal.into())))
}

/// Exchange email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = IssuedToken),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<IssuedToken>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let store = state.store.clone();
    let principal = run_blocking(move || {
        let found = store.find_by_email(&req.email)?;
        let verified = verify_password(&req.password, found.as_ref().map(|p| p.password_hash.as_str()))?;
        Ok(found.filter(|_| verified))
    })
    .await?;

    let Some(principal) = principal else {
        tracing::info!("Login rejected");
        return Err(ApiError::invalid_credentials());
    };

    let token = state.tokens.issue(&principal.id)?;
    tracing::info!(principal_id = %principal.id, "Token issued");
    Ok(Json(token))
}
