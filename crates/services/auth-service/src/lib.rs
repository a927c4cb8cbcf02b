//! Auth Service Library
//!
//! Credential issuing over gRPC: users register and log in, and every
//! protected call is checked against a signed bearer token and a role
//! permission table.

pub mod config;
pub mod grpc;
pub mod infra;
pub mod rbac;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::{error, info, warn};

use crate::config::AuthServiceConfig;
use crate::grpc::AuthGrpcService;
use crate::infra::Database;
use crate::rbac::{operations, PermissionTable, RbacInterceptor, RbacLayer};
use crate::repository::PgCredentialStore;
use crate::service::{Argon2Hasher, Authenticator, TokenEngine};
use common::DatabaseConfig;

/// Migration subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run the gRPC server until SIGINT or SIGTERM, then drain.
pub async fn run_server(config: AuthServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let permissions = match &config.rbac_policy_path {
        Some(path) => PermissionTable::load(path)?,
        None => PermissionTable::standard(),
    };
    let addr: SocketAddr = config.service.addr().parse()?;

    let database = Database::connect(&config.database).await?;
    let health_check = database.spawn_health_check(config.database.health_check_interval);

    let tokens = Arc::new(TokenEngine::from_config(&config.jwt)?);
    let auth_service = Authenticator::new(
        Arc::new(PgCredentialStore::new(database.get_connection())),
        Arc::new(Argon2Hasher),
        Arc::clone(&tokens),
    )?
    .with_register_timeout(config.register_timeout);

    let grpc_service = AuthGrpcService::new(Arc::new(auth_service), config.service.request_timeout);
    let rbac = RbacLayer::new(RbacInterceptor::new(Arc::clone(&tokens), permissions))
        .allow_public([operations::REGISTER_USER, operations::LOGIN_USER]);

    info!(
        %addr,
        token_expiry_hours = tokens.expiry_hours(),
        "Auth service listening"
    );

    let served = Server::builder()
        .layer(rbac)
        .add_service(proto::AuthServiceServer::new(grpc_service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await;

    if let Some(handle) = health_check {
        handle.abort();
    }
    if let Err(e) = database.close().await {
        warn!(error = %e, "Failed to close database pool");
    }

    match served {
        Ok(()) => {
            info!("Auth service stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Auth service terminated with error");
            Err(e.into())
        }
    }
}

/// Apply a migration command and report the result.
pub async fn run_migrations(
    action: MigrationAction,
    config: &DatabaseConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let database = Database::connect_without_migrations(config).await?;

    match action {
        MigrationAction::Up => {
            database.run_migrations().await?;
            info!("Migrations applied");
        }
        MigrationAction::Down => {
            database.rollback_migration().await?;
            info!("Last migration rolled back");
        }
        MigrationAction::Status => {
            for (name, applied) in database.migration_status().await? {
                let status = if applied { "applied" } else { "pending" };
                println!("{:<50} {}", name, status);
            }
        }
        MigrationAction::Fresh => {
            database.fresh_migrations().await?;
            info!("Database reset and all migrations applied");
        }
    }

    database.close().await?;
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received, draining in-flight calls");
}
