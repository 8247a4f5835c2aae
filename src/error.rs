// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Responder
//!
//! Every failure on the request path is an [`ApiError`] carrying an
//! [`ErrorCode`]. Each code maps to exactly one HTTP status and a stable
//! machine-readable code; the human-readable `cause` and `action` come from the
//! localized [`MessageCatalog`].
//!
//! ## Response Body
//!
//! ```json
//! {
//!   "status": 401,
//!   "code": "E401001",
//!   "cause": "Authentication is required to access this resource.",
//!   "action": "Sign in and send the access token as a Bearer token.",
//!   "timestamp": "2026-01-01T12:00:00Z",
//!   "correlationId": "5f0c..."
//! }
//! ```
//!
//! `ApiError` renders a complete English body on its own. The
//! [`respond_errors`] middleware re-renders it with the caller's locale and the
//! request's correlation id, and logs it.

use std::any::Any;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Request, State,
    },
    http::{
        header::{ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE, WWW_AUTHENTICATE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::messages::{MessageCatalog, DEFAULT_LOCALE};
use crate::state::AppState;
use crate::storage::StoreError;

/// Header carrying the correlation id of a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Enumerated failure kinds with their fixed HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request body or parameters failed validation
    BadRequest,
    /// No valid credentials on a protected route
    Unauthenticated,
    /// Presented token has expired
    TokenExpired,
    /// Presented token signature did not verify
    TokenSignatureInvalid,
    /// Presented token is not a well-formed token
    TokenMalformed,
    /// Login with unknown email or wrong password
    InvalidCredentials,
    /// Authenticated but lacking the required authority
    Forbidden,
    /// Resource or route does not exist
    NotFound,
    /// Referenced principal does not exist
    PrincipalNotFound,
    /// Route exists but not for this method
    MethodNotAllowed,
    /// Resource already exists or conflicts with current state
    Conflict,
    /// Anything unanticipated
    InternalError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::BadRequest,
        ErrorCode::Unauthenticated,
        ErrorCode::TokenExpired,
        ErrorCode::TokenSignatureInvalid,
        ErrorCode::TokenMalformed,
        ErrorCode::InvalidCredentials,
        ErrorCode::Forbidden,
        ErrorCode::NotFound,
        ErrorCode::PrincipalNotFound,
        ErrorCode::MethodNotAllowed,
        ErrorCode::Conflict,
        ErrorCode::InternalError,
    ];

    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated
            | ErrorCode::TokenExpired
            | ErrorCode::TokenSignatureInvalid
            | ErrorCode::TokenMalformed
            | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound | ErrorCode::PrincipalNotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic kind for an error status produced outside the handlers
    /// (framework rejections, empty 405s).
    ///
    /// Returns `None` for non-error statuses.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        let code = match status {
            StatusCode::UNAUTHORIZED => ErrorCode::Unauthenticated,
            StatusCode::FORBIDDEN => ErrorCode::Forbidden,
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => ErrorCode::MethodNotAllowed,
            StatusCode::CONFLICT => ErrorCode::Conflict,
            s if s.is_client_error() => ErrorCode::BadRequest,
            s if s.is_server_error() => ErrorCode::InternalError,
            _ => return None,
        };
        Some(code)
    }

    /// Parse a stable code back into its kind.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Stable machine-readable code. Clients branch on this value.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "E400001",
            ErrorCode::Unauthenticated => "E401001",
            ErrorCode::TokenExpired => "E401002",
            ErrorCode::TokenSignatureInvalid => "E401003",
            ErrorCode::TokenMalformed => "E401004",
            ErrorCode::InvalidCredentials => "E401005",
            ErrorCode::Forbidden => "E403001",
            ErrorCode::NotFound => "E404001",
            ErrorCode::PrincipalNotFound => "E404002",
            ErrorCode::MethodNotAllowed => "E405001",
            ErrorCode::Conflict => "E409001",
            ErrorCode::InternalError => "E500001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Structured error body returned for every failure.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Numeric HTTP status
    pub status: u16,
    /// Stable machine-readable code (e.g. `E401001`)
    pub code: String,
    /// Localized description of what went wrong
    pub cause: String,
    /// Localized suggestion for the caller
    pub action: String,
    /// When the error was produced
    pub timestamp: DateTime<Utc>,
    /// Identifier linking this response to server-side logs
    pub correlation_id: String,
}

impl ErrorBody {
    /// Render the body for `code` in `locale`.
    pub fn render(
        code: ErrorCode,
        catalog: &MessageCatalog,
        locale: &str,
        correlation_id: impl Into<String>,
    ) -> Self {
        let message = catalog.lookup(code, locale);
        Self {
            status: code.status().as_u16(),
            code: code.code().to_string(),
            cause: message.cause,
            action: message.action,
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
        }
    }
}

/// Marker left on error responses so [`respond_errors`] can localize them.
#[derive(Debug, Clone)]
pub struct ErrorSignal {
    pub code: ErrorCode,
    /// Internal detail for logs only; never serialized.
    pub detail: Option<String>,
}

/// Typed failure raised anywhere on the request path.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Internal detail for logs only; never sent to the client.
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::BadRequest, detail)
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::NotFound, detail)
    }

    pub fn principal_not_found(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::PrincipalNotFound, detail)
    }

    pub fn method_not_allowed(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::MethodNotAllowed, detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::Conflict, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::InternalError, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(what) => ApiError::conflict(what),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        ApiError::with_detail(err.error_code(), err.to_string())
    }
}

impl From<crate::auth::password::PasswordError> for ApiError {
    fn from(err: crate::auth::password::PasswordError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody::render(
            self.code,
            MessageCatalog::builtin(),
            DEFAULT_LOCALE,
            Uuid::new_v4().to_string(),
        );

        let mut response = (self.code.status(), Json(body)).into_response();
        if self.code.status() == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response.extensions_mut().insert(ErrorSignal {
            code: self.code,
            detail: self.detail,
        });
        response
    }
}

/// Error Responder middleware.
///
/// Re-renders any [`ApiError`] response with the locale negotiated from
/// `Accept-Language` and the correlation id from `x-request-id`, and logs it
/// under that id. Error responses that did not come from an [`ApiError`]
/// (empty or plain-text bodies from the framework) are mapped by status and
/// rendered the same way. JSON error bodies without a signal pass through.
pub async fn respond_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let locale = state.catalog.negotiate(
        request
            .headers()
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    );
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let signal = match response.extensions_mut().remove::<ErrorSignal>() {
        Some(signal) => signal,
        None => match unrendered_error(&response) {
            Some(code) => ErrorSignal {
                code,
                detail: Some(format!("framework response {}", response.status())),
            },
            None => return response,
        },
    };

    if signal.code == ErrorCode::InternalError {
        tracing::error!(
            correlation_id = %correlation_id,
            %method,
            path = %path,
            detail = signal.detail.as_deref().unwrap_or(""),
            "Request failed with internal error"
        );
    } else {
        tracing::debug!(
            correlation_id = %correlation_id,
            %method,
            path = %path,
            code = signal.code.code(),
            detail = signal.detail.as_deref().unwrap_or(""),
            "Request rejected"
        );
    }

    let body = ErrorBody::render(signal.code, &state.catalog, locale, correlation_id);
    let (mut parts, _) = response.into_parts();
    let (fresh, fresh_body) = Json(body).into_response().into_parts();

    parts.status = signal.code.status();
    parts.headers.remove(CONTENT_LENGTH);
    if let Some(content_type) = fresh.headers.get(CONTENT_TYPE) {
        parts.headers.insert(CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, fresh_body)
}

/// Error status whose body was not produced as JSON.
fn unrendered_error(response: &Response) -> Option<ErrorCode> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return None;
    }
    ErrorCode::from_status(response.status())
}

/// Response for a panicking handler; used by `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::internal(format!("panic: {detail}")).into_response()
}

/// Handler for routes that do not exist.
pub async fn route_not_found(request: Request) -> ApiError {
    ApiError::not_found(format!("no route for {}", request.uri().path()))
}

/// Handler for known routes hit with an unsupported method.
pub async fn method_not_allowed(request: Request) -> ApiError {
    ApiError::method_not_allowed(format!(
        "{} not supported on {}",
        request.method(),
        request.uri().path()
    ))
}
