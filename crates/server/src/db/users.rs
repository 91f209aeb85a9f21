//! User repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use reparto_core::{Email, Role, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Repository for user database operations.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO users (email, full_name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, role, created_at
            ",
        )
        .bind(user.email.as_str())
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_user()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserAuthRow> = sqlx::query_as(
            r"
            SELECT id, email, full_name, role, created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let hash = r.password_hash.clone();
                Ok(Some((r.user.into_user()?, hash)))
            }
            None => Ok(None),
        }
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, full_name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    full_name: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: self.id,
            email,
            full_name: self.full_name,
            role: self.role,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserAuthRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}
