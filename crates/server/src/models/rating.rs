//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_rating_core::{Email, RatingId, RatingValue, StoreId, UserId};

/// One user's rating of one store. There is at most one per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    #[serde(rename = "rating")]
    pub value: RatingValue,
    /// Time of the latest write.
    pub created_at: DateTime<Utc>,
}

/// A user who rated a store, as shown on the owner dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rater {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
}
