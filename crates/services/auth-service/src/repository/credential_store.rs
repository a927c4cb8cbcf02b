//! Credential store: user records keyed by id and by unique email.
//!
//! Every operation runs inside its own transaction and is bounded by the
//! smaller of the caller's deadline and [`STORE_OPERATION_TIMEOUT`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult, Deadline, OptionExt};
use domain::{NewUser, User, UserProfile};

#[cfg(test)]
use mockall::automock;

/// Upper bound for a single store operation, transaction included.
pub const STORE_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Credential store trait for dependency injection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user and return the generated id.
    ///
    /// Fails with `Conflict` if the email is already taken.
    async fn create_user(&self, user: NewUser, deadline: Deadline) -> AppResult<Uuid>;

    /// Full record (hash included) for an email. `NotFound` if absent.
    async fn get_user_by_email(&self, email: &str, deadline: Deadline) -> AppResult<User>;

    /// Profile for an id. `NotFound` if absent.
    async fn get_user_by_id(&self, id: Uuid, deadline: Deadline) -> AppResult<UserProfile>;
}

/// PostgreSQL-backed credential store.
pub struct PgCredentialStore {
    db: Arc<DatabaseConnection>,
}

impl PgCredentialStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Run `f` in a transaction under the operation deadline.
    ///
    /// Commits on success, rolls back on error. If the deadline fires first
    /// the in-flight transaction is dropped, which rolls it back.
    async fn with_transaction<F, T>(
        &self,
        operation: &'static str,
        deadline: Deadline,
        f: F,
    ) -> AppResult<T>
    where
        F: for<'a> FnOnce(
                &'a DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
            + Send,
        T: Send,
    {
        let deadline = deadline.shorten(STORE_OPERATION_TIMEOUT);
        match deadline.run(self.execute_transaction(operation, f)).await {
            Ok(result) => result,
            Err(timeout) => {
                warn!(operation, "Store operation exceeded its deadline");
                Err(timeout)
            }
        }
    }

    async fn execute_transaction<F, T>(&self, operation: &'static str, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(
                &'a DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
            + Send,
        T: Send,
    {
        let started = Instant::now();
        let txn = self.db.begin().await.map_err(|e| {
            error!(operation, error = %e, "Failed to start transaction");
            AppError::from(e)
        })?;

        match f(&txn).await {
            Ok(result) => {
                txn.commit().await.map_err(|e| {
                    error!(operation, error = %e, "Failed to commit transaction");
                    AppError::from(e)
                })?;
                debug!(
                    operation,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Transaction committed"
                );
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(operation, error = %rollback_err, "Transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// Unique violations become `Conflict`; everything else is a storage error.
fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("User"),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, user: NewUser, deadline: Deadline) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let roles = serde_json::to_value(&user.roles)
            .map_err(|e| AppError::storage(format!("failed to encode roles: {}", e)))?;

        let model = ActiveModel {
            id: Set(id),
            name: Set(user.profile.name),
            surname: Set(user.profile.surname),
            patronymic: Set(user.profile.patronymic),
            email: Set(user.profile.email),
            roles: Set(roles),
            password_hash: Set(user.password_hash),
            created_at: Set(Utc::now()),
        };

        self.with_transaction("create_user", deadline, move |txn| {
            Box::pin(async move {
                model.insert(txn).await.map_err(map_insert_error)?;
                Ok(id)
            })
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str, deadline: Deadline) -> AppResult<User> {
        let email = email.to_owned();
        let model = self
            .with_transaction("get_user_by_email", deadline, move |txn| {
                Box::pin(async move {
                    UserEntity::find()
                        .filter(user::Column::Email.eq(email))
                        .one(txn)
                        .await
                        .map_err(AppError::from)
                })
            })
            .await?
            .ok_or_not_found()?;

        User::try_from(model)
    }

    async fn get_user_by_id(&self, id: Uuid, deadline: Deadline) -> AppResult<UserProfile> {
        let model = self
            .with_transaction("get_user_by_id", deadline, move |txn| {
                Box::pin(async move { UserEntity::find_by_id(id).one(txn).await.map_err(AppError::from) })
            })
            .await?
            .ok_or_not_found()?;

        User::try_from(model).map(UserProfile::from)
    }
}
