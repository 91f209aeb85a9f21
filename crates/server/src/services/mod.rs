//! Business services.
//!
//! - [`orders`] - the order lifecycle manager: creation with price
//!   snapshots, acceptance, completion, listing, and history
//! - [`locations`] - the location coordinator between drivers and the
//!   geo cache
//! - [`geocoding`] - address resolution collaborator
//! - [`auth`] - registration and login

pub mod auth;
pub mod geocoding;
pub mod locations;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use geocoding::{GeocodeError, Geocoder, NominatimGeocoder};
pub use locations::{LocationError, LocationService};
pub use orders::{OrderError, OrderService};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fakes for the storage and geocoding ports.
    //!
    //! The order fake mirrors the production store's atomicity: accept and
    //! complete mutate under a single write lock, so a concurrent accept
    //! race has exactly one winner here too.

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::RwLock;

    use reparto_core::{Coordinates, OrderId, OrderStatus, ProductId, UserId};

    use crate::db::{
        AcceptOutcome, CacheError, GeoCache, OrderStore, ProductCatalog, RepositoryError,
    };
    use crate::models::{NewOrder, Order, Product};

    use super::geocoding::{GeocodeError, Geocoder};

    #[derive(Default)]
    pub struct InMemoryOrders {
        orders: RwLock<HashMap<OrderId, Order>>,
        names: RwLock<HashMap<UserId, String>>,
        seq: AtomicI64,
    }

    impl InMemoryOrders {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub async fn register_name(&self, user_id: UserId, name: &str) {
            self.names.write().await.insert(user_id, name.to_owned());
        }

        pub async fn get(&self, id: OrderId) -> Option<Order> {
            self.orders.read().await.get(&id).cloned()
        }

        async fn display_name(&self, user_id: UserId) -> String {
            self.names
                .read()
                .await
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| "user".to_owned())
        }
    }

    #[async_trait]
    impl OrderStore for InMemoryOrders {
        async fn create_with_items(&self, order: NewOrder) -> Result<OrderId, RepositoryError> {
            let id = OrderId::generate();
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            let customer_name = self.display_name(order.customer_id).await;

            let created_at = Utc
                .timestamp_opt(1_700_000_000 + seq, 0)
                .single()
                .ok_or_else(|| RepositoryError::DataCorruption("bad test clock".to_owned()))?;

            let stored = Order {
                id,
                customer_id: order.customer_id,
                customer_name,
                driver_id: None,
                driver_name: None,
                status: OrderStatus::Pending,
                origin: order.origin,
                destination: order.destination,
                destination_address: order.destination_address,
                total_price: order.total_price,
                created_at,
                items: order
                    .items
                    .into_iter()
                    .map(|item| crate::models::OrderItem {
                        product_id: item.product_id,
                        product_name: "product".to_owned(),
                        quantity: item.quantity,
                        price_at_order: item.price_at_order,
                    })
                    .collect(),
            };

            self.orders.write().await.insert(id, stored);
            Ok(id)
        }

        async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
            Ok(self.orders.read().await.get(&id).cloned())
        }

        async fn pending(&self) -> Result<Vec<Order>, RepositoryError> {
            let orders = self.orders.read().await;
            let mut pending: Vec<Order> = orders
                .values()
                .filter(|o| o.status == OrderStatus::Pending)
                .cloned()
                .collect();
            pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(pending)
        }

        async fn history_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
            let orders = self.orders.read().await;
            let mut delivered: Vec<Order> = orders
                .values()
                .filter(|o| {
                    o.status == OrderStatus::Delivered
                        && (o.customer_id == user_id || o.driver_id == Some(user_id))
                })
                .cloned()
                .collect();
            delivered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(delivered)
        }

        async fn has_active_order(&self, driver_id: UserId) -> Result<bool, RepositoryError> {
            let orders = self.orders.read().await;
            Ok(orders
                .values()
                .any(|o| o.status == OrderStatus::Assigned && o.driver_id == Some(driver_id)))
        }

        async fn accept(
            &self,
            id: OrderId,
            driver_id: UserId,
        ) -> Result<AcceptOutcome, RepositoryError> {
            let driver_name = self.display_name(driver_id).await;
            let mut orders = self.orders.write().await;

            // Same uniqueness the partial index enforces in Postgres.
            if orders
                .values()
                .any(|o| o.status == OrderStatus::Assigned && o.driver_id == Some(driver_id))
            {
                return Ok(AcceptOutcome::DriverBusy);
            }

            match orders.get_mut(&id) {
                Some(order) if order.status == OrderStatus::Pending => {
                    order.driver_id = Some(driver_id);
                    order.driver_name = Some(driver_name);
                    order.status = OrderStatus::Assigned;
                    Ok(AcceptOutcome::Accepted)
                }
                _ => Ok(AcceptOutcome::NotAvailable),
            }
        }

        async fn complete(&self, id: OrderId, driver_id: UserId) -> Result<bool, RepositoryError> {
            let mut orders = self.orders.write().await;
            match orders.get_mut(&id) {
                Some(order)
                    if order.status == OrderStatus::Assigned
                        && order.driver_id == Some(driver_id) =>
                {
                    order.status = OrderStatus::Delivered;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    #[derive(Default)]
    pub struct InMemoryCatalog {
        products: RwLock<HashMap<ProductId, Product>>,
    }

    impl InMemoryCatalog {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub async fn insert(&self, product: Product) {
            self.products.write().await.insert(product.id, product);
        }

        pub async fn set_price(&self, id: ProductId, price: rust_decimal::Decimal) {
            if let Some(product) = self.products.write().await.get_mut(&id) {
                product.price = price;
            }
        }
    }

    #[async_trait]
    impl ProductCatalog for InMemoryCatalog {
        async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
            Ok(self.products.read().await.values().cloned().collect())
        }

        async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            Ok(self.products.read().await.get(&id).cloned())
        }
    }

    /// Geocoder resolving only the addresses it was told about.
    #[derive(Default)]
    pub struct StaticGeocoder {
        known: HashMap<String, Coordinates>,
    }

    impl StaticGeocoder {
        pub fn with(addresses: &[(&str, Coordinates)]) -> Arc<Self> {
            Arc::new(Self {
                known: addresses
                    .iter()
                    .map(|(addr, coords)| ((*addr).to_owned(), *coords))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Geocoder for StaticGeocoder {
        async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
            self.known
                .get(address)
                .copied()
                .ok_or(GeocodeError::NoMatch)
        }
    }

    #[derive(Default)]
    pub struct InMemoryGeoCache {
        positions: RwLock<HashMap<UserId, Coordinates>>,
    }

    impl InMemoryGeoCache {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub async fn contains(&self, driver_id: UserId) -> bool {
            self.positions.read().await.contains_key(&driver_id)
        }
    }

    #[async_trait]
    impl GeoCache for InMemoryGeoCache {
        async fn upsert(
            &self,
            driver_id: UserId,
            position: Coordinates,
        ) -> Result<(), CacheError> {
            self.positions.write().await.insert(driver_id, position);
            Ok(())
        }

        async fn position(&self, driver_id: UserId) -> Result<Option<Coordinates>, CacheError> {
            Ok(self.positions.read().await.get(&driver_id).copied())
        }

        async fn remove(&self, driver_id: UserId) -> Result<(), CacheError> {
            self.positions.write().await.remove(&driver_id);
            Ok(())
        }
    }
}
