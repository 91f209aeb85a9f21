//! Core type definitions.

pub mod coords;
pub mod email;
pub mod id;
pub mod role;
pub mod status;

pub use coords::{Coordinates, CoordinatesError};
pub use email::{Email, EmailError};
pub use id::{OrderId, ProductId, UserId};
pub use role::Role;
pub use status::OrderStatus;
