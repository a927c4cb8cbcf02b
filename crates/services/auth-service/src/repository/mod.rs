//! Credential persistence.

mod credential_store;
pub mod entities;

pub use credential_store::{CredentialStore, PgCredentialStore, STORE_OPERATION_TIMEOUT};

#[cfg(test)]
pub use credential_store::MockCredentialStore;
