//! Store rating API server library.
//!
//! Users sign up, browse stores and rate them from 1 to 5. Store owners see
//! who rated their store, and administrators manage users and stores. The
//! binary in `main.rs` wires this library to `PostgreSQL`; tests drive the same
//! router over [`db::MemoryRepository`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::router;
pub use state::AppState;
