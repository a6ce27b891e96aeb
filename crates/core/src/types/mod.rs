//! Core types for the store rating service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod profile;
pub mod rating;
pub mod role;
pub mod sort;

pub use email::{Email, EmailError};
pub use id::*;
pub use profile::{Address, PersonName, PlainPassword, ProfileError};
pub use rating::{RatingError, RatingValue};
pub use role::{Role, RoleError};
pub use sort::{SortDirection, SortSpec};
