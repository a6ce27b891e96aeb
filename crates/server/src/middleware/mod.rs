//! HTTP middleware stack for the API server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. CORS
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Authorization gate (per route group, see [`auth`])

pub mod auth;
pub mod request_id;

pub use auth::{AuthUser, Gate, RequiredRoles, authorize, require_roles};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
