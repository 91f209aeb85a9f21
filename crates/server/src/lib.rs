//! Reparto delivery server library.
//!
//! This crate provides the server functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router over the given state.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
