//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                      - Liveness
//! GET   /health/ready                - Readiness (storage ping)
//!
//! # Auth
//! POST  /api/auth/signup             - Register a user account
//! POST  /api/auth/login              - Exchange credentials for a token
//! PATCH /api/auth/update-password    - Change own password (any role)
//!
//! # Admin (role: admin)
//! GET   /api/admin/dashboard         - Platform totals
//! GET   /api/admin/users             - List users (name, email, role, sort)
//! POST  /api/admin/users             - Create a user with any role
//! GET   /api/admin/users/{id}        - User detail, with store summary for owners
//! GET   /api/admin/stores            - List stores (name, email, sort)
//! POST  /api/admin/stores            - Create a store
//!
//! # User (role: user)
//! GET   /api/user/stores             - List stores with own rating
//! POST  /api/user/ratings            - Submit or replace a rating
//! PATCH /api/user/ratings/{storeId}  - Change an existing rating
//!
//! # Owner (role: owner)
//! GET   /api/owner/dashboard         - Own store aggregate and raters
//! ```

pub mod admin;
pub mod auth;
pub mod owner;
pub mod user;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use serde_json::Value;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{Gate, RequiredRoles, request_id_middleware, require_roles};
use crate::state::AppState;

/// JSON body extractor that rejects with an [`AppError`] body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor that rejects with an [`AppError`] body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor that rejects with an [`AppError`] body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Build the complete application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(&state))
        .nest("/admin", admin_routes(&state))
        .nest("/user", user_routes(&state))
        .nest("/owner", owner_routes(&state));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
}

/// Create the auth routes router.
fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = gated(
        Router::new().route("/update-password", patch(auth::update_password)),
        state,
        RequiredRoles::ANY,
    );

    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(protected)
}

/// Create the admin routes router.
fn admin_routes(state: &AppState) -> Router<AppState> {
    gated(
        Router::new()
            .route("/dashboard", get(admin::dashboard))
            .route("/users", get(admin::list_users).post(admin::create_user))
            .route("/users/{id}", get(admin::get_user))
            .route("/stores", get(admin::list_stores).post(admin::create_store)),
        state,
        RequiredRoles::ADMIN,
    )
}

/// Create the user routes router.
fn user_routes(state: &AppState) -> Router<AppState> {
    gated(
        Router::new()
            .route("/stores", get(user::list_stores))
            .route("/ratings", post(user::submit_rating))
            .route("/ratings/{store_id}", patch(user::update_rating)),
        state,
        RequiredRoles::USER,
    )
}

/// Create the owner routes router.
fn owner_routes(state: &AppState) -> Router<AppState> {
    gated(
        Router::new().route("/dashboard", get(owner::dashboard)),
        state,
        RequiredRoles::OWNER,
    )
}

/// Put every route of `router` behind the authorization gate.
fn gated(router: Router<AppState>, state: &AppState, required: RequiredRoles) -> Router<AppState> {
    router.route_layer(from_fn_with_state(
        Gate::new(state.tokens().clone(), required),
        require_roles,
    ))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if storage is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.repo().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_owned())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Treat empty query values as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Read an integer from a JSON number or a numeric string.
fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read an `i32` identifier from a JSON number or a numeric string.
fn identifier(value: Option<&Value>) -> Option<i32> {
    integer(value).and_then(|n| i32::try_from(n).ok())
}
