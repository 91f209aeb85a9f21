//! CLI subcommand implementations.

pub mod migrate;
pub mod seed;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

/// Database URL from `REPARTO_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    std::env::var("REPARTO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}

#[derive(Debug, thiserror::Error)]
#[error("REPARTO_DATABASE_URL (or DATABASE_URL) not set")]
pub struct MissingDatabaseUrl;

/// Connect to the configured database.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let url = database_url()?;
    Ok(PgPool::connect(url.expose_secret()).await?)
}
