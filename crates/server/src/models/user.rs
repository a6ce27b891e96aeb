//! User domain types.

use std::str::FromStr;

use serde::Serialize;

use store_rating_core::{Address, Email, PersonName, Role, UserId};

use super::store::StoreSummary;

/// A registered account.
///
/// The password hash is never part of this type; it is only read through
/// the dedicated credential lookups in [`crate::db::UserRepository`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique across users.
    pub email: Email,
    /// Optional postal address.
    pub address: Option<String>,
    /// Account role.
    pub role: Role,
}

/// A user ready to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: PersonName,
    pub email: Email,
    pub password_hash: String,
    pub address: Option<Address>,
    pub role: Role,
}

/// Filters for the admin user listing. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact email.
    pub email: Option<String>,
    /// Exact role.
    pub role: Option<Role>,
}

/// Columns the user listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Email,
    Role,
}

impl UserSortField {
    /// Sort expression over the `users` table. Roles sort by name, not by
    /// enum position.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Role => "role::text",
        }
    }
}

impl FromStr for UserSortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "role" => Ok(Self::Role),
            _ => Err(()),
        }
    }
}

/// A user as shown on the admin detail page.
///
/// `store_info` is only serialized for owners, where it is `null` if the
/// owner has no store yet.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "storeInfo", skip_serializing_if = "Option::is_none")]
    pub store_info: Option<Option<StoreSummary>>,
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub users_count: i64,
    pub stores_count: i64,
    pub ratings_count: i64,
}
