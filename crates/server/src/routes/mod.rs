//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (pings the database)
//!
//! # Auth
//! POST /api/auth/register               - Create an account
//! POST /api/auth/login                  - Exchange credentials for a token
//!
//! # Products
//! GET  /api/products                    - Product catalog
//!
//! # Orders (requires auth)
//! POST  /api/orders                     - Place an order (customer)
//! GET   /api/orders/pending             - Orders up for grabs (driver)
//! GET   /api/orders/history             - Caller's delivered orders
//! GET   /api/orders/{id}                - One order with items
//! PATCH /api/orders/{id}/accept         - Claim a pending order (driver)
//! PATCH /api/orders/{id}/complete       - Mark a delivery done (driver)
//!
//! # Locations (requires auth)
//! POST /api/orders/location             - Report driver position (driver)
//! GET  /api/orders/{id}/location        - Where is my order (customer)
//! ```

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/products", get(products::list))
        .route("/orders", post(orders::create))
        .route("/orders/pending", get(orders::pending))
        .route("/orders/history", get(orders::history))
        .route("/orders/location", post(orders::update_location))
        .route("/orders/{id}", get(orders::by_id))
        .route("/orders/{id}/accept", patch(orders::accept))
        .route("/orders/{id}/complete", patch(orders::complete))
        .route("/orders/{id}/location", get(orders::location))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}
