//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, password login and password changes
//! - `token` - Signed identity tokens
//! - `ratings` - The rating ledger (submit, update, aggregates)
//! - `directory` - User and store listings, dashboards, store creation
//!
//! Services borrow the shared [`Repository`](crate::db::Repository) for the
//! duration of one request and keep no state of their own.

pub mod auth;
pub mod directory;
pub mod ratings;
pub mod token;

pub use auth::{AuthError, AuthService, NewAccount};
pub use directory::{DirectoryError, DirectoryService};
pub use ratings::{LedgerError, RatingService};
pub use token::{Claims, TokenError, TokenService};
