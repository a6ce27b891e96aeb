//! End-to-end tests for the store rating server.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory storage, no external services
//! cargo test -p store-rating-integration-tests
//!
//! # Also run the PostgreSQL-backed tests (database is wiped)
//! TEST_DATABASE_URL=postgres://localhost/store_rating_test \
//!     cargo test -p store-rating-integration-tests -- --include-ignored
//! ```
//!
//! Each [`TestServer`] binds the real router to an ephemeral port and talks to
//! it over HTTP with `reqwest`.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};

use reqwest::{Client, Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use store_rating_core::{Email, PersonName, PlainPassword, Role};
use store_rating_server::db::{self, MemoryRepository, PgRepository, Repository};
use store_rating_server::services::{AuthService, NewAccount, TokenService};
use store_rating_server::{AppState, router};

/// Signing secret shared by every test server.
pub const TEST_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

/// Password used for accounts created with [`TestServer::account`].
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Held by every server backed by `TEST_DATABASE_URL`. Tests share one
/// database, so only one of them may use it at a time.
static DATABASE: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// A server running on an ephemeral port.
pub struct TestServer {
    addr: SocketAddr,
    client: Client,
    repo: Arc<dyn Repository>,
    tokens: TokenService,
    _database: Option<MutexGuard<'static, ()>>,
}

impl TestServer {
    /// Spawn a server over a fresh in-memory repository.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MemoryRepository::new())).await
    }

    /// Spawn a server over an empty, migrated `PostgreSQL` database.
    ///
    /// Returns `None` when `TEST_DATABASE_URL` is unset. Waits until no other
    /// `PostgreSQL` server in this process is alive, then truncates.
    pub async fn spawn_postgres() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let guard = DATABASE.lock().await;
        let pool = db::create_pool(&SecretString::from(url)).await.unwrap();

        sqlx::migrate!("../server/migrations")
            .run(&pool)
            .await
            .unwrap();
        sqlx::query("TRUNCATE ratings, stores, users RESTART IDENTITY CASCADE")
            .execute(&pool)
            .await
            .unwrap();

        Some(Self::start(Arc::new(PgRepository::new(pool)), Some(guard)).await)
    }

    /// Spawn a server over `repo`.
    pub async fn spawn_with(repo: Arc<dyn Repository>) -> Self {
        Self::start(repo, None).await
    }

    async fn start(
        repo: Arc<dyn Repository>,
        database: Option<MutexGuard<'static, ()>>,
    ) -> Self {
        let tokens = TokenService::new(
            &SecretString::from(TEST_SECRET),
            chrono::Duration::hours(24),
        );
        let app = router(AppState::new(repo.clone(), tokens.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            repo,
            tokens,
            _database: database,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// The token service the server verifies with.
    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create an account of any role directly in storage and log it in over
    /// HTTP. Returns the bearer token.
    pub async fn account(&self, name: &str, email: &str, role: Role) -> String {
        AuthService::new(self.repo.as_ref())
            .register(NewAccount {
                name: PersonName::parse(name).unwrap(),
                email: Email::parse(email).unwrap(),
                password: PlainPassword::parse(TEST_PASSWORD).unwrap(),
                address: None,
                role,
            })
            .await
            .unwrap();

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_owned()
    }

    /// Send a request and decode the response body as JSON, or as a JSON
    /// string when it is not JSON.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.unwrap();
        let status = response.status();
        let text = response.text().await.unwrap();
        let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        (status, value)
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, path, Some(token), Some(body)).await
    }
}
