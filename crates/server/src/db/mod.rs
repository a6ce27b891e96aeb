//! Storage for users, stores and ratings.
//!
//! # Tables
//!
//! - `users` - Accounts with Argon2 password hashes and a `user_role`
//! - `stores` - Rated stores, optionally owned by a user
//! - `ratings` - One row per (user, store) pair, `UNIQUE (user_id, store_id)`
//!
//! Access goes through the [`Repository`] trait so handlers and services can
//! run against [`PgRepository`] in production and [`MemoryRepository`] in
//! tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p store-rating-cli -- migrate
//! ```

mod memory;
mod ratings;
mod stores;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_rating_core::{Email, RatingValue, SortSpec, StoreId, UserId};

use crate::models::{
    NewStore, NewUser, OwnerStore, Rater, Rating, Store, StoreAggregate, StoreFilter,
    StoreSortField, User, UserFilter, UserSortField, ViewerStoreListing,
};

pub use memory::MemoryRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row does not exist (foreign key violation).
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Get a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user and their password hash by email, for login.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Get a user's password hash by ID.
    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// List users matching `filter`. Without a sort, users come back by ID.
    async fn list_users(
        &self,
        filter: &UserFilter,
        sort: Option<SortSpec<UserSortField>>,
    ) -> Result<Vec<User>, RepositoryError>;

    /// Total number of users.
    async fn count_users(&self) -> Result<i64, RepositoryError>;
}

/// Store storage.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Insert a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists and
    /// `RepositoryError::InvalidReference` if the owner does not exist.
    async fn create_store(&self, store: NewStore) -> Result<Store, RepositoryError>;

    /// Whether a store with this ID exists.
    async fn store_exists(&self, id: StoreId) -> Result<bool, RepositoryError>;

    /// List stores matching `filter` with owner name and live aggregate.
    ///
    /// When `viewer` is set, each listing carries that user's own rating.
    /// Without a sort, stores come back by ID.
    async fn list_stores(
        &self,
        filter: &StoreFilter,
        sort: Option<SortSpec<StoreSortField>>,
        viewer: Option<UserId>,
    ) -> Result<Vec<ViewerStoreListing>, RepositoryError>;

    /// The lowest-ID store owned by `owner`, with its aggregate.
    async fn find_owner_store(&self, owner: UserId) -> Result<Option<OwnerStore>, RepositoryError>;

    /// Total number of stores.
    async fn count_stores(&self) -> Result<i64, RepositoryError>;
}

/// Rating storage.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert the rating, or replace the value and timestamp of the existing
    /// rating for the same (user, store) pair, in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the user or store does
    /// not exist.
    async fn upsert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError>;

    /// Replace the value of an existing rating. Returns `None` if the user
    /// has not rated the store.
    async fn update_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// Mean and count of a store's ratings.
    async fn aggregate_for(&self, store: StoreId) -> Result<StoreAggregate, RepositoryError>;

    /// Users who rated a store, newest rating first.
    async fn list_raters(&self, store: StoreId) -> Result<Vec<Rater>, RepositoryError>;

    /// Total number of ratings.
    async fn count_ratings(&self) -> Result<i64, RepositoryError>;
}

/// Full storage interface used by the application.
#[async_trait]
pub trait Repository: UserRepository + StoreRepository + RatingRepository {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL` implementation of [`Repository`].
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an email read back from storage.
fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

/// Parse a rating value read back from storage.
fn parse_rating(raw: i16) -> Result<RatingValue, RepositoryError> {
    RatingValue::new(i64::from(raw))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid rating in database: {e}")))
}

/// Map constraint violations on insert to typed repository errors.
fn map_write_error(e: sqlx::Error, conflict: &str, reference: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::InvalidReference(reference.to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Build an `ILIKE` pattern matching `needle` anywhere, with `%`, `_` and
/// `\` taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
