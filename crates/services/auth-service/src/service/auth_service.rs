//! Register and login workflow.
//!
//! Registration validates input, rejects duplicate emails, hashes the
//! password off the async runtime and stores the user with the default
//! role set. Login verifies credentials and issues a bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::hasher::PasswordHasher;
use super::token::TokenEngine;
use crate::config::DEFAULT_REGISTER_TIMEOUT;
use crate::repository::CredentialStore;
use common::{AppError, AppResult, Deadline};
use domain::{NewUser, Registration, RoleSet, UserProfile, TOKEN_TYPE_BEARER};

/// Token response returned after successful authentication
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user and return its id
    async fn register(&self, registration: Registration, deadline: Deadline) -> AppResult<Uuid>;

    /// Check credentials and return a signed token
    async fn login(
        &self,
        email: String,
        password: String,
        deadline: Deadline,
    ) -> AppResult<TokenResponse>;

    /// Profile of an existing user
    async fn get_user(&self, id: Uuid, deadline: Deadline) -> AppResult<UserProfile>;
}

/// Concrete [`AuthService`] over a credential store.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenEngine>,
    /// Verified against when the email is unknown, so both login failure
    /// paths cost one hash verification.
    dummy_hash: Arc<str>,
    register_timeout: Duration,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenEngine>,
    ) -> AppResult<Self> {
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string())?;

        Ok(Self {
            store,
            hasher,
            tokens,
            dummy_hash: dummy_hash.into(),
            register_timeout: DEFAULT_REGISTER_TIMEOUT,
        })
    }

    /// Override the upper bound on a register call.
    pub fn with_register_timeout(mut self, timeout: Duration) -> Self {
        self.register_timeout = timeout;
        self
    }

    async fn hash_password(&self, password: String, deadline: Deadline) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let hashing = task::spawn_blocking(move || hasher.hash(&password));

        // on timeout the blocking task runs to completion and its result is dropped
        deadline
            .run(hashing)
            .await?
            .map_err(|e| AppError::hashing(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(
        &self,
        password: String,
        hash: String,
        deadline: Deadline,
    ) -> AppResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let verifying = task::spawn_blocking(move || hasher.verify(&password, &hash));

        deadline
            .run(verifying)
            .await?
            .map_err(|e| AppError::hashing(format!("verification task failed: {}", e)))
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, registration: Registration, deadline: Deadline) -> AppResult<Uuid> {
        let deadline = deadline.shorten(self.register_timeout);

        registration.check()?;

        match self
            .store
            .get_user_by_email(&registration.email, deadline)
            .await
        {
            Ok(_) => {
                info!(email = %registration.email, "Registration rejected: email already in use");
                return Err(AppError::conflict("User"));
            }
            Err(AppError::NotFound) => {}
            Err(e) => {
                error!(error = %e, "Failed to look up user during registration");
                return Err(e);
            }
        }

        let profile = registration.profile();
        let password_hash = self
            .hash_password(registration.password, deadline)
            .await
            .inspect_err(|e| warn!(error = %e, "Password hashing did not complete"))?;

        let id = self
            .store
            .create_user(
                NewUser {
                    profile,
                    roles: RoleSet::default_for_new_user(),
                    password_hash,
                },
                deadline,
            )
            .await?;

        info!(user_id = %id, "User registered");
        Ok(id)
    }

    async fn login(
        &self,
        email: String,
        password: String,
        deadline: Deadline,
    ) -> AppResult<TokenResponse> {
        let user = match self.store.get_user_by_email(&email, deadline).await {
            Ok(user) => Some(user),
            Err(AppError::NotFound) => None,
            Err(e) => {
                error!(error = %e, "Failed to look up user during login");
                return Err(e);
            }
        };

        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let verified = self.verify_password(password, hash, deadline).await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                info!(email = %email, "Login failed");
                return Err(AppError::InvalidCredentials);
            }
        };

        let access_token = self.tokens.issue(user.id, &user.roles).map_err(|e| {
            error!(user_id = %user.id, error = %e, "Failed to sign token");
            AppError::from(e)
        })?;

        info!(user_id = %user.id, "User logged in");
        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.tokens.expires_in(),
        })
    }

    async fn get_user(&self, id: Uuid, deadline: Deadline) -> AppResult<UserProfile> {
        self.store.get_user_by_id(id, deadline).await
    }
}
