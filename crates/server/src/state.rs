//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Repository;
use crate::services::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// storage backend and the token service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repo: Arc<dyn Repository>,
    tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `repo` - Storage backend (`PgRepository` in production)
    /// * `tokens` - Token service configured with the signing secret
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, tokens: TokenService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { repo, tokens }),
        }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.inner.repo.as_ref()
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
