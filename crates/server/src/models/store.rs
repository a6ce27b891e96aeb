//! Store domain types and the derived rating aggregate.

use std::str::FromStr;

use serde::Serialize;

use store_rating_core::{Address, Email, PersonName, RatingValue, StoreId, UserId};

use super::rating::Rater;

/// A rated store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: Option<String>,
    pub owner_id: Option<UserId>,
}

/// A store ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: PersonName,
    pub email: Email,
    pub address: Option<Address>,
    pub owner_id: Option<UserId>,
}

/// Mean and count of a store's ratings, computed on every read.
///
/// `average_rating` is exactly `0.0` when `rating_count` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StoreAggregate {
    pub average_rating: f64,
    pub rating_count: i64,
}

impl StoreAggregate {
    /// Build an aggregate from raw rating values.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = RatingValue>) -> Self {
        let (sum, count) = values
            .into_iter()
            .fold((0_i64, 0_i64), |(sum, count), value| {
                (sum + i64::from(value.get()), count + 1)
            });
        if count == 0 {
            return Self::default();
        }
        #[allow(clippy::cast_precision_loss)] // Rating sums stay far below 2^52
        let average_rating = sum as f64 / count as f64;
        Self {
            average_rating,
            rating_count: count,
        }
    }
}

/// Filters for store listings. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact email.
    pub email: Option<String>,
    /// Case-insensitive substring of the address.
    pub address: Option<String>,
}

/// Columns the store listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSortField {
    Name,
    Email,
    AverageRating,
}

impl StoreSortField {
    /// Column or alias in the listing query.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "s.name",
            Self::Email => "s.email",
            Self::AverageRating => "average_rating",
        }
    }
}

impl FromStr for StoreSortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "average_rating" => Ok(Self::AverageRating),
            _ => Err(()),
        }
    }
}

/// A store with its owner name and live aggregate, as listed to admins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: Store,
    pub owner_name: Option<String>,
    #[serde(flatten)]
    pub aggregate: StoreAggregate,
}

/// A store listing together with the viewer's own rating, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerStoreListing {
    #[serde(flatten)]
    pub listing: StoreListing,
    pub user_rating: Option<RatingValue>,
}

/// The store an owner manages, with its aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerStore {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: Option<String>,
    #[serde(flatten)]
    pub aggregate: StoreAggregate,
}

/// Short store summary attached to an owner's user detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSummary {
    pub store_id: StoreId,
    pub store_name: String,
    #[serde(flatten)]
    pub aggregate: StoreAggregate,
}

impl From<OwnerStore> for StoreSummary {
    fn from(store: OwnerStore) -> Self {
        Self {
            store_id: store.id,
            store_name: store.name,
            aggregate: store.aggregate,
        }
    }
}

/// Everything the owner dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerDashboard {
    #[serde(rename = "storeInfo")]
    pub store_info: OwnerStore,
    pub raters: Vec<Rater>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rating(value: i64) -> RatingValue {
        RatingValue::new(value).unwrap()
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        let aggregate = StoreAggregate::from_values([]);
        assert_eq!(aggregate.rating_count, 0);
        assert!(aggregate.average_rating.abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_mean() {
        let aggregate = StoreAggregate::from_values([rating(5), rating(4), rating(3)]);
        assert_eq!(aggregate.rating_count, 3);
        assert!((aggregate.average_rating - 4.0).abs() < f64::EPSILON);

        let aggregate = StoreAggregate::from_values([rating(5), rating(2)]);
        assert!((aggregate.average_rating - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_viewer_listing_serializes_flat() {
        let listing = ViewerStoreListing {
            listing: StoreListing {
                store: Store {
                    id: StoreId::new(1),
                    name: "Amazing Electronics Store Name Here".to_owned(),
                    email: Email::parse("electronics@store.com").unwrap(),
                    address: Some("123 Main Street, City".to_owned()),
                    owner_id: None,
                },
                owner_name: None,
                aggregate: StoreAggregate::from_values([rating(4)]),
            },
            user_rating: None,
        };

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["rating_count"], 1);
        assert_eq!(json["average_rating"], 4.0);
        assert!(json["user_rating"].is_null());
        assert!(json["owner_id"].is_null());
    }

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(
            "average_rating".parse::<StoreSortField>(),
            Ok(StoreSortField::AverageRating)
        );
        assert!("owner_id".parse::<StoreSortField>().is_err());
    }
}
