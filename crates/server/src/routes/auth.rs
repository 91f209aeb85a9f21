//! Registration and login endpoints.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use reparto_core::{Role, UserId};

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Request to create an account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: SecretString,
    pub role: Role,
}

/// Request to exchange credentials for a token.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            full_name: user.full_name,
            role: user.role,
        }
    }
}

/// Successful login or registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Create an account and issue a token for it.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns `AppError` for invalid input or a duplicate email.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state
        .auth()
        .register(&req.email, &req.full_name, &req.password, req.role)
        .await?;

    let token = state
        .jwt()
        .issue(user.id, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Exchange credentials for a token.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns `AppError` when the credentials do not match an account.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.auth().login(&req.email, &req.password).await?;

    let token = state
        .jwt()
        .issue(user.id, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
