//! `PostgreSQL` queries for stores and their live aggregates.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};

use store_rating_core::{Address, SortSpec, StoreId, UserId};

use super::{
    PgRepository, RepositoryError, StoreRepository, contains_pattern, map_write_error,
    parse_email, parse_rating,
};
use crate::models::{
    NewStore, OwnerStore, Store, StoreAggregate, StoreFilter, StoreListing, StoreSortField,
    ViewerStoreListing,
};

#[derive(FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    email: String,
    address: Option<String>,
    owner_id: Option<i32>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            email: parse_email(&row.email)?,
            address: row.address,
            owner_id: row.owner_id.map(UserId::new),
        })
    }
}

#[derive(FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    store: StoreRow,
    owner_name: Option<String>,
    average_rating: f64,
    rating_count: i64,
    user_rating: Option<i16>,
}

impl TryFrom<ListingRow> for ViewerStoreListing {
    type Error = RepositoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            listing: StoreListing {
                store: Store::try_from(row.store)?,
                owner_name: row.owner_name,
                aggregate: StoreAggregate {
                    average_rating: row.average_rating,
                    rating_count: row.rating_count,
                },
            },
            user_rating: row.user_rating.map(parse_rating).transpose()?,
        })
    }
}

#[derive(FromRow)]
struct OwnerStoreRow {
    id: i32,
    name: String,
    email: String,
    address: Option<String>,
    average_rating: f64,
    rating_count: i64,
}

#[async_trait]
impl StoreRepository for PgRepository {
    async fn create_store(&self, store: NewStore) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO stores (name, email, address, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, address, owner_id
            ",
        )
        .bind(store.name.as_str())
        .bind(store.email.as_str())
        .bind(store.address.as_ref().map(Address::as_str))
        .bind(store.owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "store email already exists", "owner does not exist"))?;

        Store::try_from(row)
    }

    async fn store_exists(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM stores WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool())
                .await?;
        Ok(exists)
    }

    async fn list_stores(
        &self,
        filter: &StoreFilter,
        sort: Option<SortSpec<StoreSortField>>,
        viewer: Option<UserId>,
    ) -> Result<Vec<ViewerStoreListing>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r"
            SELECT s.id, s.name, s.email, s.address, s.owner_id,
                   u.name AS owner_name,
                   COALESCE(AVG(r.value)::float8, 0) AS average_rating,
                   COUNT(r.id) AS rating_count,
                   ur.value AS user_rating
            FROM stores s
            LEFT JOIN users u ON u.id = s.owner_id
            LEFT JOIN ratings r ON r.store_id = s.id
            LEFT JOIN ratings ur ON ur.store_id = s.id AND ur.user_id = ",
        );
        query.push_bind(viewer);
        query.push(" WHERE TRUE");

        if let Some(name) = &filter.name {
            query.push(" AND s.name ILIKE ").push_bind(contains_pattern(name));
        }
        if let Some(email) = &filter.email {
            query.push(" AND s.email = ").push_bind(email.clone());
        }
        if let Some(address) = &filter.address {
            query
                .push(" AND s.address ILIKE ")
                .push_bind(contains_pattern(address));
        }

        query.push(" GROUP BY s.id, u.name, ur.value");

        match sort {
            Some(spec) => {
                query
                    .push(" ORDER BY ")
                    .push(spec.field.column())
                    .push(" ")
                    .push(spec.direction.as_sql())
                    .push(", s.id ASC");
            }
            None => {
                query.push(" ORDER BY s.id ASC");
            }
        }

        let rows = query
            .build_query_as::<ListingRow>()
            .fetch_all(self.pool())
            .await?;

        rows.into_iter().map(ViewerStoreListing::try_from).collect()
    }

    async fn find_owner_store(&self, owner: UserId) -> Result<Option<OwnerStore>, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerStoreRow>(
            r"
            SELECT s.id, s.name, s.email, s.address,
                   COALESCE(AVG(r.value)::float8, 0) AS average_rating,
                   COUNT(r.id) AS rating_count
            FROM stores s
            LEFT JOIN ratings r ON r.store_id = s.id
            WHERE s.owner_id = $1
            GROUP BY s.id
            ORDER BY s.id ASC
            LIMIT 1
            ",
        )
        .bind(owner)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(OwnerStore {
            id: StoreId::new(row.id),
            name: row.name,
            email: parse_email(&row.email)?,
            address: row.address,
            aggregate: StoreAggregate {
                average_rating: row.average_rating,
                rating_count: row.rating_count,
            },
        }))
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stores")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
