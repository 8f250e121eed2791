//! Accounts and opaque bearer tokens.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;
use uuid::Uuid;

use shared::{Credentials, LoginData, User, ValidationErrors};

use crate::store::{StoreError, StoredUser, UserStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("The email has already been taken.")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    token_ttl: Option<Duration>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, token_ttl: Option<Duration>) -> Self {
        Self { users, token_ttl }
    }

    pub async fn register(&self, credentials: Credentials) -> Result<User, AuthError> {
        credentials.validate_registration()?;
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(credentials.password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();
        let user = StoredUser {
            id: Uuid::new_v4(),
            email: credentials.normalized_email(),
            password_hash,
        };
        if !self.users.insert_user(&user).await? {
            return Err(AuthError::EmailTaken);
        }
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user.public())
    }

    /// Verifies the password and issues a fresh token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, credentials: Credentials) -> Result<LoginData, AuthError> {
        credentials.validate_login()?;
        let user = self
            .users
            .user_by_email(&credentials.normalized_email())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let parsed =
            PasswordHash::new(&user.password_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        if Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed)
            .is_err()
        {
            tracing::warn!(user_id = %user.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4().simple().to_string();
        self.users.put_token(&token, user.id, self.token_ttl).await?;
        tracing::info!(user_id = %user.id, "token issued");
        Ok(LoginData {
            token,
            user: user.public(),
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        Ok(self.users.revoke_token(token).await?)
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AuthError> {
        Ok(self.users.token_owner(token).await?)
    }

    pub async fn user(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.user(id).await?.map(|u| u.public()))
    }
}
