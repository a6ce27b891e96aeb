//! Read-side views over users and stores, plus store creation.

use thiserror::Error;

use store_rating_core::{Role, SortDirection, SortSpec, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{
    DashboardCounts, NewStore, OwnerDashboard, Store, StoreFilter, StoreListing, StoreSortField,
    StoreSummary, User, UserDetail, UserFilter, UserSortField, ViewerStoreListing,
};

/// Errors from directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user not found")]
    UserNotFound,

    #[error("no store found for this owner")]
    NoStoreForOwner,

    #[error("store email already exists")]
    DuplicateStoreEmail,

    #[error("owner does not exist")]
    UnknownOwner,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Listing order for the store list shown to regular users.
const VIEWER_STORE_ORDER: SortSpec<StoreSortField> = SortSpec {
    field: StoreSortField::Name,
    direction: SortDirection::Asc,
};

/// Directory queries used by the admin, user and owner views.
pub struct DirectoryService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> DirectoryService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// List users matching `filter`, ordered by `sort` or by ID.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn list_users(
        &self,
        filter: &UserFilter,
        sort: Option<SortSpec<UserSortField>>,
    ) -> Result<Vec<User>, DirectoryError> {
        Ok(self.repo.list_users(filter, sort).await?)
    }

    /// A user with, for owners, a summary of their store.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::UserNotFound` if the user does not exist.
    pub async fn user_detail(&self, id: UserId) -> Result<UserDetail, DirectoryError> {
        let user = self
            .repo
            .get_user(id)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;

        let store_info = if user.role == Role::Owner {
            let store = self.repo.find_owner_store(user.id).await?;
            Some(store.map(StoreSummary::from))
        } else {
            None
        };

        Ok(UserDetail { user, store_info })
    }

    /// Admin store listing with owner name and live aggregate.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn list_stores(
        &self,
        filter: &StoreFilter,
        sort: Option<SortSpec<StoreSortField>>,
    ) -> Result<Vec<StoreListing>, DirectoryError> {
        let listings = self.repo.list_stores(filter, sort, None).await?;
        Ok(listings.into_iter().map(|entry| entry.listing).collect())
    }

    /// Store listing for a regular user, by name, with that user's own
    /// rating on each store.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn list_stores_for_viewer(
        &self,
        filter: &StoreFilter,
        viewer: UserId,
    ) -> Result<Vec<ViewerStoreListing>, DirectoryError> {
        Ok(self
            .repo
            .list_stores(filter, Some(VIEWER_STORE_ORDER), Some(viewer))
            .await?)
    }

    /// Create a store.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::DuplicateStoreEmail` if the email is taken and
    /// `DirectoryError::UnknownOwner` if the owner does not exist.
    pub async fn create_store(&self, store: NewStore) -> Result<Store, DirectoryError> {
        let store = self.repo.create_store(store).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => DirectoryError::DuplicateStoreEmail,
            RepositoryError::InvalidReference(_) => DirectoryError::UnknownOwner,
            other => DirectoryError::Repository(other),
        })?;

        tracing::info!(store_id = %store.id, "Store created");
        Ok(store)
    }

    /// Platform-wide totals.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if a count fails.
    pub async fn dashboard_counts(&self) -> Result<DashboardCounts, DirectoryError> {
        Ok(DashboardCounts {
            users_count: self.repo.count_users().await?,
            stores_count: self.repo.count_stores().await?,
            ratings_count: self.repo.count_ratings().await?,
        })
    }

    /// The owner's store with its aggregate and raters.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NoStoreForOwner` if the owner has no store.
    pub async fn owner_dashboard(&self, owner: UserId) -> Result<OwnerDashboard, DirectoryError> {
        let store_info = self
            .repo
            .find_owner_store(owner)
            .await?
            .ok_or(DirectoryError::NoStoreForOwner)?;
        let raters = self.repo.list_raters(store_info.id).await?;

        Ok(OwnerDashboard { store_info, raters })
    }
}
