//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

use store_rating_server::db;

/// Environment variables holding the database URL, in lookup order.
const DATABASE_URL_VARS: [&str; 2] = ["SERVER_DATABASE_URL", "DATABASE_URL"];

/// Read the database URL, loading `.env` first.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    first_non_empty(|var| std::env::var(var).ok()).map(SecretString::from)
}

/// The first database URL variable that is set and non-empty.
fn first_non_empty(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    DATABASE_URL_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|url| !url.is_empty()))
}

/// Connect to the database named by [`database_url`].
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if no URL is set, or the connection
/// error.
pub async fn connect() -> Result<PgPool, sqlx::Error> {
    let url = database_url().ok_or_else(|| {
        sqlx::Error::Configuration("SERVER_DATABASE_URL or DATABASE_URL must be set".into())
    })?;

    tracing::info!("Connecting to database...");
    db::create_pool(&url).await
}
