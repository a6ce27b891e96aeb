//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Every error body is JSON: `{"error": "<message>"}`, or for field-level
//! validation failures `{"errors": [{"field": "...", "message": "..."}]}`.

use std::fmt;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, DirectoryError, LedgerError, TokenError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Token signing failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Rating operation failed.
    #[error("Rating error: {0}")]
    Ledger(#[from] LedgerError),

    /// Directory operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// One or more request fields are invalid.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No bearer token was presented.
    #[error("Access token required")]
    Unauthenticated,

    /// The bearer token failed verification.
    #[error("Invalid token")]
    InvalidToken,

    /// The caller's role may not use this endpoint.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidOldPassword => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::BAD_REQUEST,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Ledger(err) => match err {
                LedgerError::InvalidRating(_) => StatusCode::BAD_REQUEST,
                LedgerError::StoreNotFound | LedgerError::RatingNotFound => StatusCode::NOT_FOUND,
                LedgerError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Directory(err) => match err {
                DirectoryError::UserNotFound | DirectoryError::NoStoreForOwner => {
                    StatusCode::NOT_FOUND
                }
                DirectoryError::DuplicateStoreEmail | DirectoryError::UnknownOwner => {
                    StatusCode::BAD_REQUEST
                }
                DirectoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing message. Never exposes internal error details.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return "Internal server error".to_owned();
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                AuthError::InvalidOldPassword => "Invalid old password".to_owned(),
                AuthError::UserAlreadyExists => "User already exists".to_owned(),
                _ => "User not found".to_owned(),
            },
            Self::Ledger(err) => match err {
                LedgerError::StoreNotFound => "Store not found".to_owned(),
                LedgerError::RatingNotFound => "Rating not found".to_owned(),
                other => other.to_string(),
            },
            Self::Directory(err) => match err {
                DirectoryError::UserNotFound => "User not found".to_owned(),
                DirectoryError::NoStoreForOwner => "No store found for this owner".to_owned(),
                DirectoryError::DuplicateStoreEmail => "Store email already exists".to_owned(),
                other => other.to_string(),
            },
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Field-level errors, for errors that carry them.
    fn field_errors(&self) -> Option<Vec<FieldError>> {
        match self {
            Self::Validation(errors) => Some(errors.0.clone()),
            Self::Ledger(LedgerError::InvalidRating(err)) => Some(vec![FieldError {
                field: "rating",
                message: err.to_string(),
            }]),
            Self::Directory(DirectoryError::UnknownOwner) => Some(vec![FieldError {
                field: "owner_id",
                message: "owner does not exist".to_owned(),
            }]),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = match self.field_errors() {
            Some(errors) => json!({ "errors": errors }),
            None => json!({ "error": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Validation
// =============================================================================

/// One invalid request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collects every invalid field of a request before responding.
///
/// ```rust,ignore
/// let mut errors = ValidationErrors::default();
/// let name = errors.check("name", PersonName::parse(&body.name));
/// let email = errors.check("email", Email::parse(&body.email));
/// let (Some(name), Some(email)) = (name, email) else {
///     return Err(errors.into());
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Record an error for `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Keep the value of `result`, or record its error against `field`.
    pub fn check<T, E: fmt::Display>(
        &mut self,
        field: &'static str,
        result: std::result::Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    /// Record `message` against `field` when `value` is absent.
    pub fn require<T>(&mut self, field: &'static str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.push(field, message);
        }
        value
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields with errors, in the order they were recorded.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    /// `Ok` if no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every recorded error otherwise.
    pub fn finish(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

// =============================================================================
// Sentry Helpers
// =============================================================================

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("rating", "Rating submitted", Some(&[("store_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
