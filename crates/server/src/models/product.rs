//! Product catalog domain type.

use rust_decimal::Decimal;
use serde::Serialize;

use reparto_core::ProductId;

/// A catalog product.
///
/// `price` is the *current* catalog price; orders snapshot it into
/// `price_at_order` at creation and never look back.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}
