//! Order lifecycle and location endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use reparto_core::OrderId;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::Order;
use crate::services::orders::OrderLine;
use crate::state::AppState;

/// Request to place an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub destination_address: String,
    pub items: Vec<OrderLine>,
}

/// Response to a placed order.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: OrderId,
}

/// Request to report a driver position.
#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

/// A driver's last reported position.
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub lat: f64,
    pub lng: f64,
}

/// Place an order.
///
/// POST /api/orders (customer)
///
/// # Errors
///
/// Returns `AppError` for invalid items, an unresolvable address, or an
/// unknown product.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    user.require_customer()
        .map_err(|_| AppError::Forbidden("only customers can place orders".to_string()))?;

    let id = state
        .orders()
        .create_order(user.id, &req.destination_address, &req.items)
        .await?;

    Ok((StatusCode::CREATED, Json(CreateOrderResponse { id })))
}

/// Orders up for grabs, newest first.
///
/// GET /api/orders/pending (driver)
///
/// # Errors
///
/// Returns `AppError` if the listing query fails.
pub async fn pending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Order>>, AppError> {
    user.require_driver()
        .map_err(|_| AppError::Forbidden("only drivers can browse pending orders".to_string()))?;

    let orders = state.orders().pending_orders().await?;
    Ok(Json(orders))
}

/// The caller's delivered orders, newest first.
///
/// GET /api/orders/history
///
/// # Errors
///
/// Returns `AppError` if the history query fails.
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.orders().user_history(user.id).await?;
    Ok(Json(orders))
}

/// One order with its items. Visible only to its participants.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns `AppError` when the order does not exist or the caller is
/// neither its customer nor its driver.
pub async fn by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = state.orders().order_by_id(id).await?;

    if order.customer_id != user.id && order.driver_id != Some(user.id) {
        return Err(AppError::Forbidden(
            "order belongs to someone else".to_string(),
        ));
    }

    Ok(Json(order))
}

/// Claim a pending order.
///
/// PATCH /api/orders/{id}/accept (driver)
///
/// # Errors
///
/// Returns `AppError` when the order is gone, already claimed, or the
/// driver still has an open delivery.
pub async fn accept(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    user.require_driver()
        .map_err(|_| AppError::Forbidden("only drivers can accept orders".to_string()))?;

    state.orders().accept_order(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a delivery done.
///
/// PATCH /api/orders/{id}/complete (driver)
///
/// # Errors
///
/// Returns `AppError` when the order is gone, assigned to someone else,
/// or not in a completable state.
pub async fn complete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    user.require_driver()
        .map_err(|_| AppError::Forbidden("only drivers can complete orders".to_string()))?;

    state.orders().complete_order(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Report the driver's current position.
///
/// POST /api/orders/location (driver)
///
/// # Errors
///
/// Returns `AppError` for out-of-range coordinates or when the driver has
/// no active delivery.
pub async fn update_location(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateLocationRequest>,
) -> Result<StatusCode, AppError> {
    user.require_driver()
        .map_err(|_| AppError::Forbidden("only drivers report positions".to_string()))?;

    state
        .locations()
        .update_location(user.id, req.lat, req.lng)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Where is my order.
///
/// GET /api/orders/{id}/location (customer who placed it)
///
/// # Errors
///
/// Returns `AppError` when the order is gone, belongs to someone else,
/// has no driver yet, or the driver has not reported a position.
pub async fn location(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<LocationResponse>, AppError> {
    let position = state.locations().order_location(id, user.id).await?;

    Ok(Json(LocationResponse {
        lat: position.lat(),
        lng: position.lng(),
    }))
}
