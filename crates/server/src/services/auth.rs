//! Registration and login.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use reparto_core::{Email, EmailError, Role};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors produced by registration and login.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email or password did not match a known user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Password does not meet the minimum requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// The email address is not valid.
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    /// Full name missing or blank.
    #[error("full name is required")]
    MissingName,

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Unexpected store failure.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::UserAlreadyExists,
            other => Self::Repository(other),
        }
    }
}

/// Handles account creation and credential verification.
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new account with the given role.
    ///
    /// # Errors
    ///
    /// - `InvalidEmail` / `WeakPassword` / `MissingName` on bad input
    /// - `UserAlreadyExists` when the email is taken
    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::MissingName);
        }
        validate_password(password.expose_secret())?;

        let password_hash = hash_password(password.expose_secret())?;

        let user = self
            .users
            .create(NewUser {
                email,
                full_name: full_name.to_owned(),
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "account registered");
        Ok(user)
    }

    /// Verify credentials and return the account.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when either check fails.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, AuthError> {
        let (user, hash) = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password.expose_secret(), &hash)?;
        Ok(user)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::RwLock;

    use reparto_core::UserId;

    use super::*;

    #[derive(Default)]
    struct InMemoryUsers {
        by_email: RwLock<HashMap<String, (User, String)>>,
    }

    #[async_trait]
    impl UserStore for InMemoryUsers {
        async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
            let mut users = self.by_email.write().await;
            if users.contains_key(user.email.as_str()) {
                return Err(RepositoryError::Conflict("email already exists".to_owned()));
            }

            let stored = User {
                id: UserId::generate(),
                email: user.email,
                full_name: user.full_name,
                role: user.role,
                created_at: Utc::now(),
            };
            users.insert(
                stored.email.as_str().to_owned(),
                (stored.clone(), user.password_hash),
            );
            Ok(stored)
        }

        async fn get_by_email(
            &self,
            email: &str,
        ) -> Result<Option<(User, String)>, RepositoryError> {
            Ok(self.by_email.read().await.get(email).cloned())
        }

        async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .by_email
                .read()
                .await
                .values()
                .find(|(u, _)| u.id == id)
                .map(|(u, _)| u.clone()))
        }
    }

    fn service() -> AuthService {
        AuthService::new(Arc::new(InMemoryUsers::default()))
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let auth = service();
        let password = secret("correct horse battery");

        let created = auth
            .register("ana@example.com", "Ana Pérez", &password, Role::Customer)
            .await
            .expect("registered");
        assert_eq!(created.role, Role::Customer);

        let logged_in = auth
            .login("ana@example.com", &password)
            .await
            .expect("logged in");
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let auth = service();

        assert!(matches!(
            auth.register("not-an-email", "Ana", &secret("long enough pw"), Role::Driver)
                .await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("ana@example.com", "  ", &secret("long enough pw"), Role::Driver)
                .await,
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            auth.register("ana@example.com", "Ana", &secret("short"), Role::Driver)
                .await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let auth = service();
        let password = secret("correct horse battery");

        auth.register("ana@example.com", "Ana", &password, Role::Customer)
            .await
            .expect("registered");

        assert!(matches!(
            auth.register("ana@example.com", "Other Ana", &password, Role::Driver)
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(
            "ana@example.com",
            "Ana",
            &secret("correct horse battery"),
            Role::Customer,
        )
        .await
        .expect("registered");

        assert!(matches!(
            auth.login("ana@example.com", &secret("wrong password!")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", &secret("wrong password!"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
