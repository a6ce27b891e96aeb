//! In-memory storage backend for tests and local demos.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use store_rating_core::{
    Address, Email, RatingId, RatingValue, SortDirection, SortSpec, StoreId, UserId,
};

use super::{RatingRepository, Repository, RepositoryError, StoreRepository, UserRepository};
use crate::models::{
    NewStore, NewUser, OwnerStore, Rater, Rating, Store, StoreAggregate, StoreFilter,
    StoreListing, StoreSortField, User, UserFilter, UserSortField, ViewerStoreListing,
};

/// In-memory [`Repository`].
///
/// All tables sit behind one mutex, so every operation is atomic with respect
/// to every other. Data is lost when the repository is dropped.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<StoredUser>,
    stores: Vec<Store>,
    ratings: Vec<Rating>,
    next_user_id: i32,
    next_store_id: i32,
    next_rating_id: i32,
    last_write: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    /// Current time, strictly after every earlier write so "newest first"
    /// ordering never ties.
    fn write_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_write {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_write = Some(timestamp);
        timestamp
    }

    fn user(&self, id: UserId) -> Option<&StoredUser> {
        self.users.iter().find(|stored| stored.user.id == id)
    }

    fn store(&self, id: StoreId) -> Option<&Store> {
        self.stores.iter().find(|store| store.id == id)
    }

    fn aggregate(&self, store: StoreId) -> StoreAggregate {
        StoreAggregate::from_values(
            self.ratings
                .iter()
                .filter(|rating| rating.store_id == store)
                .map(|rating| rating.value),
        )
    }

    fn viewer_rating(&self, store: StoreId, viewer: UserId) -> Option<RatingValue> {
        self.ratings
            .iter()
            .find(|rating| rating.store_id == store && rating.user_id == viewer)
            .map(|rating| rating.value)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.users.iter().any(|stored| stored.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(Tables::next_id(&mut tables.next_user_id)),
            name: user.name.into_inner(),
            email: user.email,
            address: user.address.map(Address::into_inner),
            role: user.role,
        };
        tables.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });

        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().user(id).map(|stored| stored.user.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .find(|stored| &stored.user.email == email)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .user(id)
            .map(|stored| stored.password_hash.clone()))
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock();
        let stored = tables
            .users
            .iter_mut()
            .find(|stored| stored.user.id == id)
            .ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut stored.password_hash);
        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        sort: Option<SortSpec<UserSortField>>,
    ) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.lock();
        let mut users: Vec<User> = tables
            .users
            .iter()
            .map(|stored| &stored.user)
            .filter(|user| {
                filter
                    .name
                    .as_deref()
                    .is_none_or(|name| contains_ignore_case(&user.name, name))
                    && filter
                        .email
                        .as_deref()
                        .is_none_or(|email| user.email.as_str() == email)
                    && filter.role.is_none_or(|role| user.role == role)
            })
            .cloned()
            .collect();

        if let Some(spec) = sort {
            users.sort_by(|a, b| {
                let ordering = match spec.field {
                    UserSortField::Name => a.name.cmp(&b.name),
                    UserSortField::Email => a.email.as_str().cmp(b.email.as_str()),
                    UserSortField::Role => a.role.as_str().cmp(b.role.as_str()),
                };
                directed(ordering, spec.direction)
            });
        }

        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.tables.lock().users.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn create_store(&self, store: NewStore) -> Result<Store, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.stores.iter().any(|existing| existing.email == store.email) {
            return Err(RepositoryError::Conflict(
                "store email already exists".to_owned(),
            ));
        }
        if let Some(owner) = store.owner_id
            && tables.user(owner).is_none()
        {
            return Err(RepositoryError::InvalidReference(
                "owner does not exist".to_owned(),
            ));
        }

        let created = Store {
            id: StoreId::new(Tables::next_id(&mut tables.next_store_id)),
            name: store.name.into_inner(),
            email: store.email,
            address: store.address.map(Address::into_inner),
            owner_id: store.owner_id,
        };
        tables.stores.push(created.clone());

        Ok(created)
    }

    async fn store_exists(&self, id: StoreId) -> Result<bool, RepositoryError> {
        Ok(self.tables.lock().store(id).is_some())
    }

    async fn list_stores(
        &self,
        filter: &StoreFilter,
        sort: Option<SortSpec<StoreSortField>>,
        viewer: Option<UserId>,
    ) -> Result<Vec<ViewerStoreListing>, RepositoryError> {
        let tables = self.tables.lock();
        let mut listings: Vec<ViewerStoreListing> = tables
            .stores
            .iter()
            .filter(|store| {
                filter
                    .name
                    .as_deref()
                    .is_none_or(|name| contains_ignore_case(&store.name, name))
                    && filter
                        .email
                        .as_deref()
                        .is_none_or(|email| store.email.as_str() == email)
                    && filter.address.as_deref().is_none_or(|address| {
                        store
                            .address
                            .as_deref()
                            .is_some_and(|a| contains_ignore_case(a, address))
                    })
            })
            .map(|store| ViewerStoreListing {
                listing: StoreListing {
                    store: store.clone(),
                    owner_name: store
                        .owner_id
                        .and_then(|owner| tables.user(owner))
                        .map(|stored| stored.user.name.clone()),
                    aggregate: tables.aggregate(store.id),
                },
                user_rating: viewer.and_then(|viewer| tables.viewer_rating(store.id, viewer)),
            })
            .collect();

        if let Some(spec) = sort {
            listings.sort_by(|a, b| {
                let (a, b) = (&a.listing, &b.listing);
                let ordering = match spec.field {
                    StoreSortField::Name => a.store.name.cmp(&b.store.name),
                    StoreSortField::Email => a.store.email.as_str().cmp(b.store.email.as_str()),
                    StoreSortField::AverageRating => a
                        .aggregate
                        .average_rating
                        .total_cmp(&b.aggregate.average_rating),
                };
                directed(ordering, spec.direction)
            });
        }

        Ok(listings)
    }

    async fn find_owner_store(&self, owner: UserId) -> Result<Option<OwnerStore>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .stores
            .iter()
            .filter(|store| store.owner_id == Some(owner))
            .min_by_key(|store| store.id.as_i32())
            .map(|store| OwnerStore {
                id: store.id,
                name: store.name.clone(),
                email: store.email.clone(),
                address: store.address.clone(),
                aggregate: tables.aggregate(store.id),
            }))
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.tables.lock().stores.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl RatingRepository for MemoryRepository {
    async fn upsert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut tables = self.tables.lock();
        if tables.user(user).is_none() || tables.store(store).is_none() {
            return Err(RepositoryError::InvalidReference(
                "user or store does not exist".to_owned(),
            ));
        }

        let created_at = tables.write_timestamp();
        if let Some(existing) = tables
            .ratings
            .iter_mut()
            .find(|rating| rating.user_id == user && rating.store_id == store)
        {
            existing.value = value;
            existing.created_at = created_at;
            return Ok(existing.clone());
        }

        let rating = Rating {
            id: RatingId::new(Tables::next_id(&mut tables.next_rating_id)),
            user_id: user,
            store_id: store,
            value,
            created_at,
        };
        tables.ratings.push(rating.clone());

        Ok(rating)
    }

    async fn update_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Option<Rating>, RepositoryError> {
        let mut tables = self.tables.lock();
        let created_at = tables.write_timestamp();
        Ok(tables
            .ratings
            .iter_mut()
            .find(|rating| rating.user_id == user && rating.store_id == store)
            .map(|existing| {
                existing.value = value;
                existing.created_at = created_at;
                existing.clone()
            }))
    }

    async fn aggregate_for(&self, store: StoreId) -> Result<StoreAggregate, RepositoryError> {
        Ok(self.tables.lock().aggregate(store))
    }

    async fn list_raters(&self, store: StoreId) -> Result<Vec<Rater>, RepositoryError> {
        let tables = self.tables.lock();
        let mut ratings: Vec<&Rating> = tables
            .ratings
            .iter()
            .filter(|rating| rating.store_id == store)
            .collect();
        ratings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });

        Ok(ratings
            .into_iter()
            .filter_map(|rating| {
                tables.user(rating.user_id).map(|stored| Rater {
                    user_id: stored.user.id,
                    name: stored.user.name.clone(),
                    email: stored.user.email.clone(),
                    rating: rating.value,
                    created_at: rating.created_at,
                })
            })
            .collect())
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.tables.lock().ratings.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use store_rating_core::{PersonName, Role};

    use super::*;

    async fn seed_user(repo: &MemoryRepository, name: &str, email: &str) -> User {
        repo.create_user(NewUser {
            name: PersonName::parse(name).unwrap(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            address: None,
            role: Role::User,
        })
        .await
        .unwrap()
    }

    async fn seed_store(repo: &MemoryRepository, name: &str, email: &str) -> Store {
        repo.create_store(NewStore {
            name: PersonName::parse(name).unwrap(),
            email: Email::parse(email).unwrap(),
            address: Address::parse_optional(Some("1 Market Street")).unwrap(),
            owner_id: None,
        })
        .await
        .unwrap()
    }

    fn rating(value: i64) -> RatingValue {
        RatingValue::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_user_email_conflicts() {
        let repo = MemoryRepository::new();
        seed_user(&repo, "First Account Holder Name", "same@example.com").await;

        let result = repo
            .create_user(NewUser {
                name: PersonName::parse("Second Account Holder Name").unwrap(),
                email: Email::parse("same@example.com").unwrap(),
                password_hash: "hash".to_owned(),
                address: None,
                role: Role::User,
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_pair() {
        let repo = MemoryRepository::new();
        let user = seed_user(&repo, "Regular User Name Long Enough", "user@example.com").await;
        let store = seed_store(&repo, "Amazing Electronics Store Name", "shop@store.com").await;

        let first = repo.upsert_rating(user.id, store.id, rating(5)).await.unwrap();
        let second = repo.upsert_rating(user.id, store.id, rating(2)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.created_at > first.created_at);
        assert_eq!(repo.count_ratings().await.unwrap(), 1);

        let aggregate = repo.aggregate_for(store.id).await.unwrap();
        assert_eq!(aggregate.rating_count, 1);
        assert!((aggregate.average_rating - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_upsert_unknown_store_is_invalid_reference() {
        let repo = MemoryRepository::new();
        let user = seed_user(&repo, "Regular User Name Long Enough", "user@example.com").await;

        let result = repo
            .upsert_rating(user.id, StoreId::new(99), rating(3))
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_update_missing_rating_returns_none() {
        let repo = MemoryRepository::new();
        let user = seed_user(&repo, "Regular User Name Long Enough", "user@example.com").await;
        let store = seed_store(&repo, "Amazing Electronics Store Name", "shop@store.com").await;

        let updated = repo.update_rating(user.id, store.id, rating(4)).await.unwrap();
        assert!(updated.is_none());
        assert_eq!(repo.count_ratings().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_store_with_unknown_owner() {
        let repo = MemoryRepository::new();
        let result = repo
            .create_store(NewStore {
                name: PersonName::parse("Amazing Electronics Store Name").unwrap(),
                email: Email::parse("shop@store.com").unwrap(),
                address: None,
                owner_id: Some(UserId::new(42)),
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_list_stores_filters_case_insensitively() {
        let repo = MemoryRepository::new();
        seed_store(&repo, "Amazing Electronics Store Name", "shop@store.com").await;
        seed_store(&repo, "Fashion Boutique Shopping Center", "fashion@store.com").await;

        let filter = StoreFilter {
            name: Some("ELECTRONICS".to_owned()),
            ..StoreFilter::default()
        };
        let listings = repo.list_stores(&filter, None, None).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].listing.store.email.as_str(), "shop@store.com");

        let filter = StoreFilter {
            address: Some("market".to_owned()),
            ..StoreFilter::default()
        };
        assert_eq!(repo.list_stores(&filter, None, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_raters_newest_first() {
        let repo = MemoryRepository::new();
        let alice = seed_user(&repo, "Alice Account Holder Name", "alice@example.com").await;
        let bob = seed_user(&repo, "Bob Account Holder Name Here", "bob@example.com").await;
        let store = seed_store(&repo, "Amazing Electronics Store Name", "shop@store.com").await;

        repo.upsert_rating(alice.id, store.id, rating(4)).await.unwrap();
        repo.upsert_rating(bob.id, store.id, rating(2)).await.unwrap();

        let raters = repo.list_raters(store.id).await.unwrap();
        let ids: Vec<UserId> = raters.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![bob.id, alice.id]);

        // Re-rating moves Alice back to the top
        repo.upsert_rating(alice.id, store.id, rating(5)).await.unwrap();
        let raters = repo.list_raters(store.id).await.unwrap();
        assert_eq!(raters[0].user_id, alice.id);
        assert_eq!(raters[0].rating.get(), 5);
    }
}
