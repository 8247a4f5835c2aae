// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface: routes, OpenAPI document and the request pipeline.
//!
//! Layers, outermost first: request id, trace span, CORS, error responder,
//! panic catcher, authentication filter, authorization gate.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        middleware::{authenticate, authorize},
        IssuedToken, Role,
    },
    error::{
        method_not_allowed, panic_response, respond_errors, route_not_found, ApiError, ErrorBody,
        REQUEST_ID_HEADER,
    },
    models::{LoginRequest, RegisterRequest, UserListResponse, UserResponse},
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/users/me", get(users::me))
        .route("/users/{principal_id}", get(users::get_user))
        .route("/admin/users", get(users::list_users));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive())
                .layer(from_fn_with_state(state.clone(), respond_errors))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(from_fn_with_state(state.clone(), authenticate))
                .layer(from_fn_with_state(state.clone(), authorize)),
        )
        .with_state(state)
}

/// Run store or hashing work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {e}")))?
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        accounts::register,
        accounts::login,
        users::me,
        users::get_user,
        users::list_users
    ),
    components(
        schemas(
            ErrorBody,
            RegisterRequest,
            LoginRequest,
            IssuedToken,
            UserResponse,
            UserListResponse,
            Role,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Principal lookup"),
        (name = "Admin", description = "Administrative endpoints")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{hash_password, MIN_BCRYPT_COST};
    use crate::frn::Frn;
    use crate::state::test_support::test_state;
    use crate::storage::Principal;
    use axum::{
        body::to_bytes,
        http::{header, StatusCode},
    };
    use chrono::{TimeDelta, Utc};
    use serde_json::{json, Value};
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    const PASSWORD: &str = "correct horse battery";

    fn seed(state: &AppState, id: &str, email: &str, roles: &[Role]) -> Principal {
        let principal = Principal {
            id: id.parse().unwrap(),
            email: email.to_string(),
            display_name: email.split('@').next().unwrap().to_string(),
            password_hash: hash_password(PASSWORD, MIN_BCRYPT_COST).unwrap(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            created_at: Utc::now(),
        };
        state.store.insert(principal.clone()).unwrap();
        principal
    }

    fn bearer(state: &AppState, id: &Frn) -> String {
        format!("Bearer {}", state.tokens.issue(id).unwrap().access_token)
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_with(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let state = test_state();
        let (status, body) = send(&state, get_with("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["credential_store"], "ok");

        let (status, _) = send(&state, get_with("/health/live", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let state = test_state();
        let (status, body) = send(&state, get_with("/api-doc/openapi.json", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/v1/users/{principal_id}"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthenticated() {
        let state = test_state();
        let (status, body) = send(&state, get_with("/v1/users/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
        assert_eq!(body["code"], "E401001");
    }

    #[tokio::test]
    async fn expired_token_on_protected_route_is_unauthenticated() {
        let state = test_state();
        let principal = seed(&state, "frn:flashdash:user:abc123", "ada@flashdash.io", &[Role::User]);
        let expired = state
            .tokens
            .issue_at(&principal.id, Utc::now() - TimeDelta::hours(2))
            .unwrap()
            .access_token;

        let (status, body) =
            send(&state, get_with("/v1/users/me", Some(&format!("Bearer {expired}")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "E401001");
    }

    #[tokio::test]
    async fn error_body_is_localized() {
        let state = test_state();
        let request = Request::builder()
            .uri("/v1/users/me")
            .header(header::ACCEPT_LANGUAGE, "es-ES,es;q=0.9")
            .body(Body::empty())
            .unwrap();

        let (_, body) = send(&state, request).await;
        let expected = state
            .catalog
            .lookup(crate::error::ErrorCode::Unauthenticated, "es");
        assert_eq!(body["cause"], expected.cause);
        assert_eq!(body["action"], expected.action);
    }

    #[tokio::test]
    async fn correlation_id_follows_request_id() {
        let state = test_state();
        let request = Request::builder()
            .uri("/v1/users/me")
            .header(REQUEST_ID_HEADER, "req-7f3a")
            .body(Body::empty())
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "req-7f3a");
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["correlationId"], "req-7f3a");
    }

    #[tokio::test]
    async fn generated_request_id_becomes_correlation_id() {
        let state = test_state();
        let response = router(state)
            .oneshot(get_with("/v1/users/me", None))
            .await
            .unwrap();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["correlationId"], request_id);
    }

    #[tokio::test]
    async fn register_login_and_fetch_self() {
        let state = test_state();

        let (status, created) = send(
            &state,
            post_json(
                "/v1/auth/register",
                json!({"email": "ada@flashdash.io", "password": PASSWORD, "displayName": "Ada"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["roles"], json!(["user"]));
        assert!(created["id"].as_str().unwrap().starts_with("frn:flashdash:user:"));
        assert!(created.get("passwordHash").is_none());

        let (status, token) = send(
            &state,
            post_json(
                "/v1/auth/login",
                json!({"email": "ADA@flashdash.io", "password": PASSWORD}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(token["tokenType"], "Bearer");
        let access = token["accessToken"].as_str().unwrap();

        let (status, me) = send(
            &state,
            get_with("/v1/users/me", Some(&format!("Bearer {access}"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], created["id"]);
        assert_eq!(me["displayName"], "Ada");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let state = test_state();
        seed(&state, "frn:flashdash:user:abc123", "ada@flashdash.io", &[Role::User]);

        let (status, body) = send(
            &state,
            post_json(
                "/v1/auth/register",
                json!({"email": "Ada@FlashDash.io", "password": PASSWORD, "displayName": "Ada"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "E409001");
    }

    #[tokio::test]
    async fn invalid_registration_is_bad_request() {
        let state = test_state();

        let (status, body) = send(
            &state,
            post_json(
                "/v1/auth/register",
                json!({"email": "not-an-email", "password": PASSWORD, "displayName": "Ada"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "E400001");

        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "E400001");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let state = test_state();
        seed(&state, "frn:flashdash:user:abc123", "ada@flashdash.io", &[Role::User]);

        for body in [
            json!({"email": "ada@flashdash.io", "password": "wrong password"}),
            json!({"email": "nobody@flashdash.io", "password": PASSWORD}),
        ] {
            let (status, response) = send(&state, post_json("/v1/auth/login", body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(response["code"], "E401005");
        }
    }

    #[tokio::test]
    async fn users_can_read_only_themselves() {
        let state = test_state();
        let ada = seed(&state, "frn:flashdash:user:ada1", "ada@flashdash.io", &[Role::User]);
        let grace = seed(&state, "frn:flashdash:user:grace1", "grace@flashdash.io", &[Role::User]);
        let auth = bearer(&state, &ada.id);

        let (status, _) = send(&state, get_with(&format!("/v1/users/{}", ada.id), Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&state, get_with(&format!("/v1/users/{}", grace.id), Some(&auth))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "E403001");
    }

    #[tokio::test]
    async fn admin_reads_anyone_and_unknown_is_not_found() {
        let state = test_state();
        let admin = seed(&state, "frn:flashdash:user:root1", "root@flashdash.io", &[Role::Admin]);
        let ada = seed(&state, "frn:flashdash:user:ada1", "ada@flashdash.io", &[Role::User]);
        let auth = bearer(&state, &admin.id);

        let (status, body) =
            send(&state, get_with(&format!("/v1/users/{}", ada.id), Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@flashdash.io");

        let (status, body) = send(
            &state,
            get_with("/v1/users/frn:flashdash:user:missing9", Some(&auth)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "E404002");

        let (status, body) = send(&state, get_with("/v1/users/not-an-frn", Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "E400001");
    }

    #[tokio::test]
    async fn admin_listing_requires_admin() {
        let state = test_state();
        let admin = seed(&state, "frn:flashdash:user:root1", "root@flashdash.io", &[Role::Admin]);
        let ada = seed(&state, "frn:flashdash:user:ada1", "ada@flashdash.io", &[Role::User]);

        let (status, body) =
            send(&state, get_with("/v1/admin/users", Some(&bearer(&state, &ada.id)))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "E403001");

        let (status, body) =
            send(&state, get_with("/v1/admin/users", Some(&bearer(&state, &admin.id)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found_for_authenticated_callers() {
        let state = test_state();
        let ada = seed(&state, "frn:flashdash:user:ada1", "ada@flashdash.io", &[Role::User]);

        let (status, body) =
            send(&state, get_with("/v1/nowhere", Some(&bearer(&state, &ada.id)))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "E404001");
    }

    #[tokio::test]
    async fn wrong_method_is_a_structured_405() {
        let state = test_state();

        let request = Request::builder()
            .uri("/v1/auth/login")
            .header(REQUEST_ID_HEADER, "req-405")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["status"], 405);
        assert_eq!(body["code"], "E405001");
        assert_eq!(body["correlationId"], "req-405");

        let request = Request::builder()
            .method("DELETE")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["code"], "E405001");
    }

    #[tokio::test]
    async fn wrong_method_body_is_localized() {
        let state = test_state();
        let request = Request::builder()
            .method("PUT")
            .uri("/health")
            .header(header::ACCEPT_LANGUAGE, "es")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let expected = state
            .catalog
            .lookup(crate::error::ErrorCode::MethodNotAllowed, "es");
        assert_eq!(body["cause"], expected.cause);
    }

    #[tokio::test]
    async fn undecodable_path_parameter_is_a_structured_400() {
        let state = test_state();
        let ada = seed(&state, "frn:flashdash:user:ada1", "ada@flashdash.io", &[Role::User]);

        let response = router(state.clone())
            .oneshot(get_with("/v1/users/%FF", Some(&bearer(&state, &ada.id))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "E400001");
        assert!(!body["correlationId"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tokens_for_deleted_principals_stay_anonymous() {
        let state = test_state();
        let ghost: Frn = "frn:flashdash:user:ghost1".parse().unwrap();

        let (status, body) =
            send(&state, get_with("/v1/users/me", Some(&bearer(&state, &ghost)))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "E401001");
    }
}
