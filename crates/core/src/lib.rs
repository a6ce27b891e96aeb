//! Store Rating Core - Shared domain types.
//!
//! This crate provides the types used across all store rating components:
//! - `server` - JSON API for admins, raters and store owners
//! - `cli` - Command-line tools for migrations, bootstrap and sample data
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP. Input policies (name length, password strength,
//! rating range) live here so the API boundary and the CLI enforce exactly
//! the same rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles, ratings and profile fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
