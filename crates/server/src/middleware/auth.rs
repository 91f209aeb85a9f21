//! Token authentication middleware and extractors.
//!
//! Provides the `CurrentUser` extractor for requiring a signed bearer token
//! in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use reparto_core::{Role, UserId};

use crate::state::AppState;

/// Bearer tokens are valid for one day.
const TOKEN_TTL_HOURS: i64 = 24;

/// Signed claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User the token was issued to.
    pub sub: UserId,
    /// Role at issuance. Role changes require a fresh login.
    pub role: Role,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

/// Token verification failures.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token")]
    Signing,
}

/// HS256 signer and verifier over the configured secret.
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtAuth {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            role,
            exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `Expired` for a lapsed token, `Invalid` for anything else
    /// that fails verification.
    pub fn authenticate(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

impl CurrentUser {
    /// Reject callers who are not drivers.
    ///
    /// # Errors
    ///
    /// Returns `AuthRejection::Forbidden` for any other role.
    pub fn require_driver(&self) -> Result<(), AuthRejection> {
        if self.role == Role::Driver {
            Ok(())
        } else {
            Err(AuthRejection::Forbidden)
        }
    }

    /// Reject callers who are not customers.
    ///
    /// # Errors
    ///
    /// Returns `AuthRejection::Forbidden` for any other role.
    pub fn require_customer(&self) -> Result<(), AuthRejection> {
        if self.role == Role::Customer {
            Ok(())
        } else {
            Err(AuthRejection::Forbidden)
        }
    }
}

/// Error returned when a request carries no usable bearer token.
#[derive(Debug)]
pub enum AuthRejection {
    /// Header missing, malformed, expired, or signature invalid.
    Unauthorized,
    /// Token is fine but the role may not perform this action.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "authentication required").into_response()
            }
            Self::Forbidden => {
                (StatusCode::FORBIDDEN, "not allowed for this role").into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthRejection::Unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AuthRejection::Unauthorized)?;

        let claims = state.jwt().authenticate(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AuthRejection::Unauthorized
        })?;

        Ok(Self {
            id: claims.sub,
            role: claims.role,
        })
    }
}
