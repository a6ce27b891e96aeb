//! Domain models for the rating service.
//!
//! These types are what the repositories return and what the routes
//! serialize. Row types used for decoding live next to the queries in
//! [`crate::db`].

pub mod rating;
pub mod store;
pub mod user;

pub use rating::{Rater, Rating};
pub use store::{
    NewStore, OwnerDashboard, OwnerStore, Store, StoreAggregate, StoreFilter, StoreListing,
    StoreSortField, StoreSummary, ViewerStoreListing,
};
pub use user::{DashboardCounts, NewUser, User, UserDetail, UserFilter, UserSortField};
