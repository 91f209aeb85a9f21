//! Product catalog endpoint.

use axum::{Json, extract::State};

use crate::error::AppError;
use crate::models::Product;
use crate::state::AppState;

/// List the product catalog.
///
/// GET /api/products
///
/// # Errors
///
/// Returns `AppError` if the catalog query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.catalog().list().await?;
    Ok(Json(products))
}
