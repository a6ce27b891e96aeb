//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! sr-cli admin create -n "Platform Administrator" -e admin@example.com -p 'AdminPass1!'
//! ```
//!
//! Admin accounts cannot be created through the public signup route, so the
//! first one has to come from here.

use thiserror::Error;

use store_rating_core::{Address, Email, PersonName, PlainPassword, Role, UserId};
use store_rating_server::db::PgRepository;
use store_rating_server::services::{AuthError, AuthService, NewAccount};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// A field failed the account policy.
    #[error("Invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// Registration failed.
    #[error("Registration failed: {0}")]
    Auth(AuthError),
}

/// Validate the arguments into an admin account.
///
/// # Errors
///
/// Returns `AdminError::Invalid` for the first field that fails its policy.
pub fn admin_account(
    name: &str,
    email: &str,
    password: &str,
    address: Option<&str>,
) -> Result<NewAccount, AdminError> {
    Ok(NewAccount {
        name: PersonName::parse(name).map_err(invalid("name"))?,
        email: Email::parse(email).map_err(invalid("email"))?,
        password: PlainPassword::parse(password).map_err(invalid("password"))?,
        address: Address::parse_optional(address).map_err(invalid("address"))?,
        role: Role::Admin,
    })
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns an error if validation fails, the email is taken or the database
/// is unreachable.
pub async fn create_admin(
    name: &str,
    email: &str,
    password: &str,
    address: Option<&str>,
) -> Result<UserId, AdminError> {
    let account = admin_account(name, email, password, address)?;

    let repo = PgRepository::new(super::connect().await?);

    tracing::info!("Creating admin account: {}", account.email);

    let user = AuthService::new(&repo)
        .register(account)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(email.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

fn invalid<E: std::fmt::Display>(field: &'static str) -> impl FnOnce(E) -> AdminError {
    move |e| AdminError::Invalid {
        field,
        message: e.to_string(),
    }
}
