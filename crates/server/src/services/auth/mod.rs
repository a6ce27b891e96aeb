//! Authentication service.
//!
//! Owns the credential rules: registration with Argon2id hashing, password
//! login and password changes. Input is already validated into core types at
//! the request boundary; plaintext passwords only pass through here on their
//! way to the hasher.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use store_rating_core::{Address, Email, PersonName, PlainPassword, Role, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{NewUser, User};

/// A validated account about to be registered.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: PersonName,
    pub email: Email,
    pub password: PlainPassword,
    pub address: Option<Address>,
    pub role: Role,
}

/// Authentication service.
///
/// Handles user registration, login, and password changes.
pub struct AuthService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn register(&self, account: NewAccount) -> Result<User, AuthError> {
        let password_hash = hash_password(account.password.expose())?;

        let user = self
            .repo
            .create_user(NewUser {
                name: account.name,
                email: account.email,
                password_hash,
                address: account.address,
                role: account.role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong, without saying which.
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .repo
            .get_credentials(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's password after re-checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOldPassword` if `old_password` does not match.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &PlainPassword,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .repo
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(old_password, &current_hash).map_err(|_| AuthError::InvalidOldPassword)?;

        let new_hash = hash_password(new_password.expose())?;
        self.repo
            .update_password_hash(user_id, &new_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryRepository, UserRepository};

    fn account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            name: PersonName::parse("Regular User Name Long Enough").unwrap(),
            email: Email::parse(email).unwrap(),
            password: PlainPassword::parse("UserPass123!").unwrap(),
            address: None,
            role,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("UserPass123!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("UserPass123!", &hash).is_ok());
        assert!(matches!(
            verify_password("WrongPass123!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("UserPass123!").unwrap();
        let second = hash_password("UserPass123!").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_garbage_hash_fails_closed() {
        assert!(matches!(
            verify_password("UserPass123!", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);

        let user = auth
            .register(account("user@example.com", Role::User))
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);

        let email = Email::parse("user@example.com").unwrap();
        let logged_in = auth.login(&email, "UserPass123!").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        // The stored hash is never the plaintext
        let stored = repo.get_password_hash(user.id).await.unwrap().unwrap();
        assert_ne!(stored, "UserPass123!");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);

        auth.register(account("user@example.com", Role::User))
            .await
            .unwrap();
        let result = auth.register(account("user@example.com", Role::Owner)).await;

        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);
        auth.register(account("user@example.com", Role::User))
            .await
            .unwrap();

        let unknown = Email::parse("nobody@example.com").unwrap();
        let known = Email::parse("user@example.com").unwrap();

        assert!(matches!(
            auth.login(&unknown, "UserPass123!").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(&known, "WrongPass123!").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);
        let user = auth
            .register(account("user@example.com", Role::User))
            .await
            .unwrap();
        let new_password = PlainPassword::parse("NewPass456#").unwrap();

        let wrong = auth
            .change_password(user.id, "NotMyPass1!", &new_password)
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidOldPassword)));

        auth.change_password(user.id, "UserPass123!", &new_password)
            .await
            .unwrap();

        let email = Email::parse("user@example.com").unwrap();
        assert!(auth.login(&email, "UserPass123!").await.is_err());
        assert!(auth.login(&email, "NewPass456#").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_for_missing_user() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);
        let new_password = PlainPassword::parse("NewPass456#").unwrap();

        let result = auth
            .change_password(UserId::new(404), "UserPass123!", &new_password)
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }
}
