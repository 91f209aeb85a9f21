//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use reparto_core::{Email, Role, UserId};

/// A registered user, either a customer or a driver.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique).
    pub email: Email,
    /// Display name shown on orders.
    pub full_name: String,
    /// Customer or driver.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
}
