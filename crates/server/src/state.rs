//! Application state shared across handlers.

use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{PgOrderStore, PgProductCatalog, PgUserStore, ProductCatalog, RedisGeoCache};
use crate::middleware::JwtAuth;
use crate::services::{AuthService, LocationService, NominatimGeocoder, OrderService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the services and the database pool.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    orders: OrderService,
    locations: LocationService,
    auth: AuthService,
    catalog: Arc<dyn ProductCatalog>,
    jwt: JwtAuth,
}

impl AppState {
    /// Wire the services onto their Postgres and Redis backends.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the geocoding HTTP client cannot be
    /// constructed.
    pub fn new(
        config: AppConfig,
        pool: PgPool,
        redis: MultiplexedConnection,
    ) -> Result<Self, reqwest::Error> {
        let order_store = Arc::new(PgOrderStore::new(pool.clone()));
        let catalog: Arc<dyn ProductCatalog> = Arc::new(PgProductCatalog::new(pool.clone()));
        let user_store = Arc::new(PgUserStore::new(pool.clone()));
        let geo_cache = Arc::new(RedisGeoCache::new(redis));
        let geocoder = Arc::new(NominatimGeocoder::new(&config.geocoding)?);

        let orders = OrderService::new(
            order_store.clone(),
            catalog.clone(),
            geocoder,
            geo_cache.clone(),
            config.depot,
        );
        let locations = LocationService::new(geo_cache, order_store);
        let auth = AuthService::new(user_store);
        let jwt = JwtAuth::new(&config.jwt_secret);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orders,
                locations,
                auth,
                catalog,
                jwt,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the order lifecycle service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get a reference to the location coordinator.
    #[must_use]
    pub fn locations(&self) -> &LocationService {
        &self.inner.locations
    }

    /// Get a reference to the auth service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn ProductCatalog> {
        &self.inner.catalog
    }

    /// Get a reference to the token signer.
    #[must_use]
    pub fn jwt(&self) -> &JwtAuth {
        &self.inner.jwt
    }
}
