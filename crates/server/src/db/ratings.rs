//! `PostgreSQL` queries for the rating ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use store_rating_core::{RatingId, RatingValue, StoreId, UserId};

use super::{
    PgRepository, RatingRepository, RepositoryError, map_write_error, parse_email, parse_rating,
};
use crate::models::{Rater, Rating, StoreAggregate};

#[derive(FromRow)]
struct RatingRow {
    id: i32,
    user_id: i32,
    store_id: i32,
    value: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RatingId::new(row.id),
            user_id: UserId::new(row.user_id),
            store_id: StoreId::new(row.store_id),
            value: parse_rating(row.value)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct RaterRow {
    user_id: i32,
    name: String,
    email: String,
    value: i16,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct AggregateRow {
    average_rating: f64,
    rating_count: i64,
}

#[async_trait]
impl RatingRepository for PgRepository {
    async fn upsert_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            INSERT INTO ratings (user_id, store_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, store_id)
            DO UPDATE SET value = EXCLUDED.value, created_at = NOW()
            RETURNING id, user_id, store_id, value, created_at
            ",
        )
        .bind(user)
        .bind(store)
        .bind(value)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "rating already exists", "user or store does not exist"))?;

        Rating::try_from(row)
    }

    async fn update_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<Option<Rating>, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            UPDATE ratings
            SET value = $3, created_at = NOW()
            WHERE user_id = $1 AND store_id = $2
            RETURNING id, user_id, store_id, value, created_at
            ",
        )
        .bind(user)
        .bind(store)
        .bind(value)
        .fetch_optional(self.pool())
        .await?;

        row.map(Rating::try_from).transpose()
    }

    async fn aggregate_for(&self, store: StoreId) -> Result<StoreAggregate, RepositoryError> {
        let row = sqlx::query_as::<_, AggregateRow>(
            r"
            SELECT COALESCE(AVG(value)::float8, 0) AS average_rating,
                   COUNT(*) AS rating_count
            FROM ratings
            WHERE store_id = $1
            ",
        )
        .bind(store)
        .fetch_one(self.pool())
        .await?;

        Ok(StoreAggregate {
            average_rating: row.average_rating,
            rating_count: row.rating_count,
        })
    }

    async fn list_raters(&self, store: StoreId) -> Result<Vec<Rater>, RepositoryError> {
        let rows = sqlx::query_as::<_, RaterRow>(
            r"
            SELECT u.id AS user_id, u.name, u.email, r.value, r.created_at
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(store)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Rater {
                    user_id: UserId::new(row.user_id),
                    name: row.name,
                    email: parse_email(&row.email)?,
                    rating: parse_rating(row.value)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
