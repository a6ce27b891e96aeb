//! Rating ledger: one rating per (user, store), replaced in place on resubmit.

use thiserror::Error;

use store_rating_core::{RatingError, RatingValue, StoreId, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{Rater, Rating, StoreAggregate};

/// Errors from rating operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Value outside 1-5.
    #[error(transparent)]
    InvalidRating(#[from] RatingError),

    /// The store does not exist.
    #[error("store not found")]
    StoreNotFound,

    /// The user has not rated this store yet.
    #[error("rating not found")]
    RatingNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Rating operations over the ledger.
pub struct RatingService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> RatingService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Submit a rating, replacing any earlier rating by the same user for
    /// the same store.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidRating` if `value` is outside 1-5 and
    /// `LedgerError::StoreNotFound` if the store does not exist.
    pub async fn submit(
        &self,
        user: UserId,
        store: StoreId,
        value: i64,
    ) -> Result<Rating, LedgerError> {
        let value = RatingValue::new(value)?;

        if !self.repo.store_exists(store).await? {
            return Err(LedgerError::StoreNotFound);
        }

        // The store can still vanish between the check and the write
        let rating = self
            .repo
            .upsert_rating(user, store, value)
            .await
            .map_err(|e| match e {
                RepositoryError::InvalidReference(_) => LedgerError::StoreNotFound,
                other => LedgerError::Repository(other),
            })?;

        tracing::info!(
            user_id = %user,
            store_id = %store,
            rating = %value,
            "Rating submitted"
        );
        Ok(rating)
    }

    /// Change the value of an existing rating.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidRating` if `value` is outside 1-5 and
    /// `LedgerError::RatingNotFound` if the user has not rated the store.
    pub async fn update(
        &self,
        user: UserId,
        store: StoreId,
        value: i64,
    ) -> Result<Rating, LedgerError> {
        let value = RatingValue::new(value)?;

        let rating = self
            .repo
            .update_rating(user, store, value)
            .await?
            .ok_or(LedgerError::RatingNotFound)?;

        tracing::info!(
            user_id = %user,
            store_id = %store,
            rating = %value,
            "Rating updated"
        );
        Ok(rating)
    }

    /// Mean and count of a store's ratings; `0.0` and `0` when unrated.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Repository` if the query fails.
    pub async fn aggregate_for(&self, store: StoreId) -> Result<StoreAggregate, LedgerError> {
        Ok(self.repo.aggregate_for(store).await?)
    }

    /// Users who rated a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Repository` if the query fails.
    pub async fn list_raters(&self, store: StoreId) -> Result<Vec<Rater>, LedgerError> {
        Ok(self.repo.list_raters(store).await?)
    }
}
