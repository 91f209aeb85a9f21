//! Storage ports and their Postgres/Redis implementations.
//!
//! # Backing stores
//!
//! - `PostgreSQL` (durable): `users`, `products`, `orders`, `order_items`.
//!   Status transitions are single conditional UPDATE statements; "who won"
//!   is decided by the affected-row count, never by an in-process lock.
//! - Redis (ephemeral): the driver position geo set. No durability is
//!   expected; it is a live-state projection only.
//!
//! Services depend on the traits below so they can be exercised against
//! in-memory fakes; the concrete types here are the production wiring.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p reparto-cli -- migrate
//! ```

pub mod geo;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use reparto_core::{Coordinates, OrderId, ProductId, UserId};

use crate::models::{NewOrder, NewUser, Order, Product, User};

pub use geo::RedisGeoCache;
pub use orders::PgOrderStore;
pub use products::PgProductCatalog;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Errors from the ephemeral geo cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache backend error from redis.
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// Cached data failed validation on the way out.
    #[error("cache data corruption: {0}")]
    DataCorruption(String),
}

/// Outcome of a conditional accept transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// This caller won: the order is now ASSIGNED to the driver.
    Accepted,
    /// Zero rows affected: the order was not PENDING anymore (or never
    /// existed) by the time the update ran.
    NotAvailable,
    /// The store's one-active-order-per-driver constraint fired: this
    /// driver already holds an ASSIGNED order.
    DriverBusy,
}

/// Durable order store.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order and all of its items as a single transaction.
    /// On any failure nothing is visible.
    async fn create_with_items(&self, order: NewOrder) -> Result<OrderId, RepositoryError>;

    /// Fetch one order with its items and denormalized names.
    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// All PENDING orders with items, most recently created first.
    async fn pending(&self) -> Result<Vec<Order>, RepositoryError>;

    /// All DELIVERED orders where the user is customer or driver,
    /// most recent first.
    async fn history_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Whether the driver currently holds an ASSIGNED order.
    async fn has_active_order(&self, driver_id: UserId) -> Result<bool, RepositoryError>;

    /// Conditional transition PENDING -> ASSIGNED. A single statement both
    /// checks the precondition and performs the update, so exactly one of
    /// any number of concurrent callers observes [`AcceptOutcome::Accepted`].
    async fn accept(
        &self,
        id: OrderId,
        driver_id: UserId,
    ) -> Result<AcceptOutcome, RepositoryError>;

    /// Conditional transition ASSIGNED -> DELIVERED, guarded by ownership.
    /// Returns `false` when zero rows were affected.
    async fn complete(&self, id: OrderId, driver_id: UserId) -> Result<bool, RepositoryError>;
}

/// Read-only product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Durable user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; duplicate emails surface as [`RepositoryError::Conflict`].
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Look up a user and their password hash by email.
    async fn get_by_email(&self, email: &str) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

/// Ephemeral driver position cache.
///
/// Overwrite semantics: each upsert replaces the driver's entry, no
/// history is retained, and entries are removed when the driver's active
/// order completes.
#[async_trait]
pub trait GeoCache: Send + Sync {
    async fn upsert(&self, driver_id: UserId, position: Coordinates) -> Result<(), CacheError>;
    async fn position(&self, driver_id: UserId) -> Result<Option<Coordinates>, CacheError>;
    async fn remove(&self, driver_id: UserId) -> Result<(), CacheError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open a multiplexed Redis connection for the geo cache.
///
/// The returned connection is cheaply cloneable and shared by all request
/// handlers.
///
/// # Errors
///
/// Returns `redis::RedisError` if the URL is invalid or the initial
/// connection fails.
pub async fn connect_redis(
    redis_url: &str,
) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    client.get_multiplexed_tokio_connection().await
}
