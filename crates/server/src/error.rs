//! Unified error handling for route handlers.
//!
//! Provides a single `AppError` that maps every service error onto an HTTP
//! status and a client-safe JSON body. All route handlers should return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::{CacheError, RepositoryError};
use crate::services::{AuthError, LocationError, OrderError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order lifecycle operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Location operation failed.
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cache operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller lacks the role or identity required for the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            tracing::error!(error = %self, "request failed");
        }

        let status = self.status_code();
        let message = self.client_message();

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl AppError {
    fn is_server_fault(&self) -> bool {
        match self {
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => true,
            Self::Order(OrderError::Repository(_)) => true,
            Self::Location(LocationError::Repository(_) | LocationError::Cache(_)) => true,
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash) => true,
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Order(err) => match err {
                OrderError::EmptyOrder
                | OrderError::InvalidQuantity(_)
                | OrderError::InvalidAddress
                | OrderError::ProductNotFound(_) => StatusCode::BAD_REQUEST,
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::UnauthorizedAction => StatusCode::FORBIDDEN,
                OrderError::NotAvailable
                | OrderError::DeliveryNotFinished
                | OrderError::InvalidState => StatusCode::CONFLICT,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Location(err) => match err {
                LocationError::InvalidCoordinates(_) | LocationError::NoDriverAssigned => {
                    StatusCode::BAD_REQUEST
                }
                LocationError::Forbidden => StatusCode::FORBIDDEN,
                LocationError::OrderNotFound | LocationError::Unavailable => StatusCode::NOT_FOUND,
                LocationError::NoActiveOrder => StatusCode::CONFLICT,
                LocationError::Repository(_) | LocationError::Cache(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::MissingName => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Server faults are never echoed to clients.
    fn client_message(&self) -> String {
        if self.is_server_fault() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Order(err) => err.to_string(),
            Self::Location(err) => err.to_string(),
            Self::Auth(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
            // Unreachable past the server-fault check, but keep it total.
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn order_errors_map_to_expected_statuses() {
        assert_eq!(
            status(AppError::Order(OrderError::EmptyOrder)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Order(OrderError::InvalidAddress)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Order(OrderError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Order(OrderError::NotAvailable)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Order(OrderError::DeliveryNotFinished)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Order(OrderError::UnauthorizedAction)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AppError::Order(OrderError::InvalidState)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn location_errors_map_to_expected_statuses() {
        assert_eq!(
            status(AppError::Location(LocationError::NoActiveOrder)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Location(LocationError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AppError::Location(LocationError::OrderNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Location(LocationError::Unavailable)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AppError::Location(LocationError::NoDriverAssigned)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_errors_map_to_expected_statuses() {
        assert_eq!(
            status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AppError::Auth(AuthError::WeakPassword("short".into()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_faults_are_redacted() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
