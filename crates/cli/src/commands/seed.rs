//! Seed the database with sample data.
//!
//! Safe to run repeatedly: accounts and stores that already exist are reused
//! and ratings are upserted.

use store_rating_core::{Address, Email, PersonName, PlainPassword, Role, StoreId, UserId};
use store_rating_server::db::{PgRepository, StoreRepository, UserRepository};
use store_rating_server::models::{NewStore, StoreFilter};
use store_rating_server::services::{
    AuthError, AuthService, DirectoryError, DirectoryService, NewAccount, RatingService,
};

struct SampleAccount {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
}

struct SampleStore {
    name: &'static str,
    email: &'static str,
    address: &'static str,
    owned: bool,
    rating: i64,
}

const OWNER: SampleAccount = SampleAccount {
    name: "Store Owner Name Long Enough",
    email: "owner@example.com",
    password: "OwnerPass123!",
    role: Role::Owner,
};

const USER: SampleAccount = SampleAccount {
    name: "Regular User Name Long Enough",
    email: "user@example.com",
    password: "UserPass123!",
    role: Role::User,
};

const STORES: [SampleStore; 3] = [
    SampleStore {
        name: "Amazing Electronics Store Name Here",
        email: "electronics@store.com",
        address: "123 Main Street, City",
        owned: true,
        rating: 5,
    },
    SampleStore {
        name: "Fashion Boutique Shopping Center",
        email: "fashion@store.com",
        address: "456 Fashion Avenue",
        owned: false,
        rating: 4,
    },
    SampleStore {
        name: "Book World Library Store Name",
        email: "books@store.com",
        address: "789 Literary Lane",
        owned: false,
        rating: 3,
    },
];

/// Insert the sample owner, user, stores and the user's ratings.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn sample() -> Result<(), Box<dyn std::error::Error>> {
    let repo = PgRepository::new(super::connect().await?);

    let owner = ensure_account(&repo, &OWNER).await?;
    let user = ensure_account(&repo, &USER).await?;

    let ledger = RatingService::new(&repo);
    for sample in &STORES {
        let store = ensure_store(&repo, sample, sample.owned.then_some(owner)).await?;
        ledger.submit(user, store, sample.rating).await?;
        tracing::info!(store = sample.name, rating = sample.rating, "Rated store");
    }

    tracing::info!(owner = OWNER.email, user = USER.email, "Sample data ready");
    Ok(())
}

/// Register `sample`, or return the existing account with its email.
async fn ensure_account(
    repo: &PgRepository,
    sample: &SampleAccount,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let email = Email::parse(sample.email)?;
    let account = NewAccount {
        name: PersonName::parse(sample.name)?,
        email: email.clone(),
        password: PlainPassword::parse(sample.password)?,
        address: None,
        role: sample.role,
    };

    match AuthService::new(repo).register(account).await {
        Ok(user) => {
            tracing::info!(email = sample.email, "Created account");
            Ok(user.id)
        }
        Err(AuthError::UserAlreadyExists) => {
            let (user, _) = repo
                .get_credentials(&email)
                .await?
                .ok_or("account vanished during seeding")?;
            tracing::info!(email = sample.email, "Account exists, reusing");
            Ok(user.id)
        }
        Err(e) => Err(e.into()),
    }
}

/// Create `sample`, or return the existing store with its email.
async fn ensure_store(
    repo: &PgRepository,
    sample: &SampleStore,
    owner: Option<UserId>,
) -> Result<StoreId, Box<dyn std::error::Error>> {
    let store = NewStore {
        name: PersonName::parse(sample.name)?,
        email: Email::parse(sample.email)?,
        address: Some(Address::parse(sample.address)?),
        owner_id: owner,
    };

    match DirectoryService::new(repo).create_store(store).await {
        Ok(store) => {
            tracing::info!(email = sample.email, "Created store");
            Ok(store.id)
        }
        Err(DirectoryError::DuplicateStoreEmail) => {
            let filter = StoreFilter {
                email: Some(sample.email.to_owned()),
                ..StoreFilter::default()
            };
            let existing = repo
                .list_stores(&filter, None, None)
                .await?
                .into_iter()
                .next()
                .ok_or("store vanished during seeding")?;
            tracing::info!(email = sample.email, "Store exists, reusing");
            Ok(existing.listing.store.id)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_pass_account_policy() {
        for sample in [&OWNER, &USER] {
            assert!(PersonName::parse(sample.name).is_ok(), "{}", sample.name);
            assert!(Email::parse(sample.email).is_ok(), "{}", sample.email);
            assert!(PlainPassword::parse(sample.password).is_ok(), "{}", sample.email);
        }
        for store in &STORES {
            assert!(PersonName::parse(store.name).is_ok(), "{}", store.name);
            assert!(Email::parse(store.email).is_ok(), "{}", store.email);
            assert!((1..=5).contains(&store.rating));
        }
    }

    #[test]
    fn test_exactly_one_owned_store() {
        assert_eq!(STORES.iter().filter(|s| s.owned).count(), 1);
    }
}
