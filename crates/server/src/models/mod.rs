//! Domain types.
//!
//! These types represent validated domain objects separate from database
//! row types; the `db` layer converts rows into them and reports anything
//! that fails validation as data corruption.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use product::Product;
pub use user::{NewUser, User};
