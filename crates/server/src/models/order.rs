//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use reparto_core::{Coordinates, OrderId, OrderStatus, ProductId, UserId};

/// A delivery order with its line items.
///
/// Display names are read-time projections joined from `users` and
/// `products`; they are never stored on the order row itself, so a renamed
/// user shows up correctly in old orders.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID (assigned by the store on creation).
    pub id: OrderId,
    /// Customer who placed the order.
    pub customer_id: UserId,
    /// Customer display name (joined at query time).
    pub customer_name: String,
    /// Assigned driver; `None` exactly while the order is PENDING.
    pub driver_id: Option<UserId>,
    /// Driver display name (joined at query time).
    pub driver_name: Option<String>,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Depot the delivery departs from.
    pub origin: Coordinates,
    /// Geocoded destination.
    pub destination: Coordinates,
    /// Free-text destination address as entered by the customer.
    pub destination_address: String,
    /// Frozen at creation: sum of item price-at-order times quantity.
    pub total_price: Decimal,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// Line items, in the order the customer submitted them.
    pub items: Vec<OrderItem>,
}

/// A line on an order, with the price frozen at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// Product being ordered.
    pub product_id: ProductId,
    /// Product display name (joined at query time).
    pub product_name: String,
    /// Units ordered; always positive.
    pub quantity: i32,
    /// Catalog price captured when the order was created. Later catalog
    /// changes never touch this.
    pub price_at_order: Decimal,
}

/// Input for creating an order, after pricing and geocoding resolved.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub destination_address: String,
    pub total_price: Decimal,
    pub items: Vec<NewOrderItem>,
}

/// A line item for a new order with its frozen price.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price_at_order: Decimal,
}
