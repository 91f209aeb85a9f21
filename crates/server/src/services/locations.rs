//! Location coordinator.
//!
//! Mediates between drivers pushing position updates and customers asking
//! where their order is. Positions are ephemeral cache state keyed by
//! driver, never written to the durable store; a missing entry is an
//! expected condition, not a fault.

use std::sync::Arc;

use reparto_core::{Coordinates, CoordinatesError, OrderId, UserId};

use crate::db::{CacheError, GeoCache, OrderStore, RepositoryError};

/// Errors produced by the location coordinator.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// Latitude or longitude outside the valid range.
    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinatesError),

    /// The driver has no ASSIGNED order, so there is nothing to track.
    #[error("no active delivery to report a position for")]
    NoActiveOrder,

    /// The order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// The caller is not the customer who placed the order.
    #[error("order belongs to a different customer")]
    Forbidden,

    /// The order has no driver yet (still PENDING).
    #[error("no driver assigned to this order yet")]
    NoDriverAssigned,

    /// The assigned driver has not reported a position yet, or the cached
    /// entry has been lost.
    #[error("driver position is not available")]
    Unavailable,

    /// Unexpected store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Unexpected cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Coordinates driver position updates and customer position queries.
pub struct LocationService {
    geo: Arc<dyn GeoCache>,
    orders: Arc<dyn OrderStore>,
}

impl LocationService {
    pub fn new(geo: Arc<dyn GeoCache>, orders: Arc<dyn OrderStore>) -> Self {
        Self { geo, orders }
    }

    /// Record a driver's current position. Last write wins.
    ///
    /// Only drivers with an ASSIGNED order may report positions; anything
    /// else would populate the cache with entries no one can ever read.
    ///
    /// # Errors
    ///
    /// - `InvalidCoordinates` when the values are out of range
    /// - `NoActiveOrder` when the driver has no ASSIGNED order
    pub async fn update_location(
        &self,
        driver_id: UserId,
        lat: f64,
        lng: f64,
    ) -> Result<(), LocationError> {
        let position = Coordinates::new(lat, lng)?;

        if !self.orders.has_active_order(driver_id).await? {
            tracing::warn!(%driver_id, "position update without an active delivery");
            return Err(LocationError::NoActiveOrder);
        }

        self.geo.upsert(driver_id, position).await?;
        Ok(())
    }

    /// Where is my order: the assigned driver's last reported position,
    /// visible only to the customer who placed the order.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if no such order exists
    /// - `Forbidden` if the caller is not the order's customer
    /// - `NoDriverAssigned` while the order is still PENDING
    /// - `Unavailable` when the driver has not reported a position
    pub async fn order_location(
        &self,
        order_id: OrderId,
        requester_id: UserId,
    ) -> Result<Coordinates, LocationError> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(LocationError::OrderNotFound)?;

        if order.customer_id != requester_id {
            tracing::warn!(%order_id, %requester_id, "location query by non-owner");
            return Err(LocationError::Forbidden);
        }

        let driver_id = order.driver_id.ok_or(LocationError::NoDriverAssigned)?;

        self.geo
            .position(driver_id)
            .await?
            .ok_or(LocationError::Unavailable)
    }
}
