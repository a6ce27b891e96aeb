//! Bearer-token authorization gate and extractor.
//!
//! Each protected route group declares its allowed roles once:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/dashboard", get(admin::dashboard))
//!     .route_layer(from_fn_with_state(
//!         Gate::new(state.tokens().clone(), RequiredRoles::ADMIN),
//!         require_roles,
//!     ))
//! ```
//!
//! Handlers behind the gate take an [`AuthUser`] argument.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use store_rating_core::{Email, Role, UserId};

use crate::error::{AppError, set_sentry_user};
use crate::services::TokenService;

/// Roles allowed through a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredRoles(&'static [Role]);

impl RequiredRoles {
    /// Any authenticated user.
    pub const ANY: Self = Self(&Role::ALL);
    pub const ADMIN: Self = Self(&[Role::Admin]);
    pub const USER: Self = Self(&[Role::User]);
    pub const OWNER: Self = Self(&[Role::Owner]);

    /// Whether `role` may pass.
    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// The verified caller, attached to the request by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

/// Check the bearer token in `headers` against `required`.
///
/// # Errors
///
/// - `AppError::Unauthenticated` if there is no bearer token
/// - `AppError::InvalidToken` if the token fails verification
/// - `AppError::Forbidden` if the token's role is not in `required`
pub fn authorize(
    headers: &HeaderMap,
    tokens: &TokenService,
    required: RequiredRoles,
) -> Result<AuthUser, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    let claims = tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::InvalidToken
    })?;

    if !required.allows(claims.role) {
        tracing::debug!(
            user_id = %claims.id,
            role = %claims.role,
            "Role not permitted for route"
        );
        return Err(AppError::Forbidden);
    }

    Ok(AuthUser {
        id: claims.id,
        email: claims.email,
        role: claims.role,
    })
}

/// Gate configuration for one route group.
#[derive(Debug, Clone)]
pub struct Gate {
    tokens: TokenService,
    required: RequiredRoles,
}

impl Gate {
    #[must_use]
    pub const fn new(tokens: TokenService, required: RequiredRoles) -> Self {
        Self { tokens, required }
    }
}

/// Middleware that runs [`authorize`] and stores the [`AuthUser`] in the
/// request extensions.
///
/// # Errors
///
/// Rejects the request with the error from [`authorize`].
pub async fn require_roles(
    State(gate): State<Gate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authorize(request.headers(), &gate.tokens, gate.required)?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
