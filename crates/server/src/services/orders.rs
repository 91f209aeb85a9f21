//! Order lifecycle manager.
//!
//! Owns every order state transition (PENDING -> ASSIGNED -> DELIVERED)
//! and the coordination with the geo cache on terminal transitions. The
//! authority for "who won" a transition race is always the store's
//! conditional write, never a check performed here: the pre-checks in
//! [`OrderService::accept_order`] and [`OrderService::complete_order`]
//! exist to give callers precise errors, and the store re-validates
//! everything atomically.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;

use reparto_core::{Coordinates, OrderId, OrderStatus, ProductId, UserId};

use crate::db::{AcceptOutcome, GeoCache, OrderStore, ProductCatalog, RepositoryError};
use crate::models::{NewOrder, NewOrderItem, Order};

use super::geocoding::Geocoder;

/// Errors produced by the order lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Order creation with no line items.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// A line item with a non-positive quantity.
    #[error("invalid quantity for product {0}")]
    InvalidQuantity(ProductId),

    /// The destination address could not be resolved to coordinates.
    #[error("destination address could not be resolved")]
    InvalidAddress,

    /// A line item referenced an unknown product.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("order not found")]
    NotFound,

    /// The order was no longer PENDING when the accept ran — another
    /// driver won the race. A normal outcome, not a fault to retry.
    #[error("order is no longer available")]
    NotAvailable,

    /// The driver already has an ASSIGNED order.
    #[error("cannot start a new delivery before finishing the current one")]
    DeliveryNotFinished,

    /// The caller is not the driver assigned to this order.
    #[error("order is assigned to a different driver")]
    UnauthorizedAction,

    /// The action is not valid for the order's current state.
    #[error("action not valid for the order's current state")]
    InvalidState,

    /// Unexpected store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One requested line on a new order.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Orchestrates order creation, listing, acceptance, completion, and
/// history.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    geocoder: Arc<dyn Geocoder>,
    geo_cache: Arc<dyn GeoCache>,
    depot: Coordinates,
}

impl OrderService {
    /// Create the lifecycle manager.
    ///
    /// `depot` is the fixed origin every delivery departs from.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        geocoder: Arc<dyn Geocoder>,
        geo_cache: Arc<dyn GeoCache>,
        depot: Coordinates,
    ) -> Self {
        Self {
            orders,
            catalog,
            geocoder,
            geo_cache,
            depot,
        }
    }

    /// Create an order: geocode the destination, freeze each item's
    /// catalog price, and write order plus items atomically.
    ///
    /// # Errors
    ///
    /// - `EmptyOrder` / `InvalidQuantity` on malformed input
    /// - `InvalidAddress` when the destination cannot be resolved
    /// - `ProductNotFound` when a line references an unknown product
    /// - `Repository` when the store write fails (nothing partial is left
    ///   behind; the insert is a single transaction)
    pub async fn create_order(
        &self,
        customer_id: UserId,
        destination_address: &str,
        lines: &[OrderLine],
    ) -> Result<OrderId, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
            return Err(OrderError::InvalidQuantity(line.product_id));
        }

        let destination = self
            .geocoder
            .resolve(destination_address)
            .await
            .map_err(|e| {
                tracing::warn!(address = destination_address, error = %e, "geocoding failed");
                OrderError::InvalidAddress
            })?;

        // Snapshot current catalog prices onto the order. Catalog changes
        // after this point never affect it.
        let mut total_price = Decimal::ZERO;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self
                .catalog
                .get_by_id(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            total_price += product.price * Decimal::from(line.quantity);
            items.push(NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                price_at_order: product.price,
            });
        }

        let order_id = self
            .orders
            .create_with_items(NewOrder {
                customer_id,
                origin: self.depot,
                destination,
                destination_address: destination_address.to_owned(),
                total_price,
                items,
            })
            .await?;

        tracing::info!(%order_id, %customer_id, %total_price, "order created");
        Ok(order_id)
    }

    /// All PENDING orders, most recently created first. Always a vector,
    /// possibly empty.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store query fails.
    pub async fn pending_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.pending().await?)
    }

    /// Accept a PENDING order on behalf of a driver.
    ///
    /// The active-order pre-check gives a precise error on the common
    /// path; the store's unique constraint re-enforces it atomically with
    /// the transition, so two simultaneous accepts from the same driver
    /// cannot both land.
    ///
    /// # Errors
    ///
    /// - `DeliveryNotFinished` if the driver already has an ASSIGNED order
    /// - `NotFound` if the order does not exist
    /// - `NotAvailable` if the order was not PENDING at the moment of the
    ///   conditional update (another driver won)
    pub async fn accept_order(
        &self,
        order_id: OrderId,
        driver_id: UserId,
    ) -> Result<(), OrderError> {
        if self.orders.has_active_order(driver_id).await? {
            return Err(OrderError::DeliveryNotFinished);
        }

        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        if order.status != OrderStatus::Pending {
            return Err(OrderError::NotAvailable);
        }

        match self.orders.accept(order_id, driver_id).await? {
            AcceptOutcome::Accepted => {
                tracing::info!(%order_id, %driver_id, "order accepted");
                Ok(())
            }
            AcceptOutcome::NotAvailable => Err(OrderError::NotAvailable),
            AcceptOutcome::DriverBusy => Err(OrderError::DeliveryNotFinished),
        }
    }

    /// Complete a delivery: conditional transition to DELIVERED, then
    /// best-effort removal of the driver's cached position.
    ///
    /// The cache delete is deliberately outside any transaction with the
    /// status change — a stale cache entry is a lesser harm than blocking
    /// a completed delivery, so its failure is logged and swallowed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `UnauthorizedAction` if the caller is not the assigned driver
    /// - `InvalidState` if the order is not ASSIGNED
    pub async fn complete_order(
        &self,
        order_id: OrderId,
        driver_id: UserId,
    ) -> Result<(), OrderError> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.driver_id != Some(driver_id) {
            tracing::warn!(%order_id, %driver_id, "completion attempt by non-assigned driver");
            return Err(OrderError::UnauthorizedAction);
        }
        if order.status != OrderStatus::Assigned {
            return Err(OrderError::InvalidState);
        }

        if !self.orders.complete(order_id, driver_id).await? {
            // Lost a race between the read above and the conditional write.
            return Err(OrderError::InvalidState);
        }
        tracing::info!(%order_id, %driver_id, "order delivered");

        if let Err(e) = self.geo_cache.remove(driver_id).await {
            tracing::warn!(%driver_id, error = %e, "failed to clear cached driver position");
        }

        Ok(())
    }

    /// Fetch one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such order exists.
    pub async fn order_by_id(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// All DELIVERED orders where the user was customer or driver, most
    /// recent first. Always a vector, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store query fails.
    pub async fn user_history(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.history_for_user(user_id).await?)
    }
}
