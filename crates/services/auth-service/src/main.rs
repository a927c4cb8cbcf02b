//! Auth Service - gRPC server for authentication.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth_service_lib::config::AuthServiceConfig;
use auth_service_lib::MigrationAction;

#[derive(Parser)]
#[command(name = "auth-service")]
#[command(about = "Credential issuing and role-based access control service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gRPC server
    Serve {
        /// Overrides AUTH_SERVICE_HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides AUTH_SERVICE_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Manage database migrations
    Migrate {
        #[arg(value_enum)]
        action: MigrateAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MigrateAction {
    /// Apply pending migrations
    Up,
    /// Roll back the last migration
    Down,
    /// List migrations and whether they are applied
    Status,
    /// Drop all tables and re-apply every migration
    Fresh,
}

impl From<MigrateAction> for MigrationAction {
    fn from(action: MigrateAction) -> Self {
        match action {
            MigrateAction::Up => MigrationAction::Up,
            MigrateAction::Down => MigrationAction::Down,
            MigrateAction::Status => MigrationAction::Status,
            MigrateAction::Fresh => MigrationAction::Fresh,
        }
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = AuthServiceConfig::from_env()?;
            if let Some(host) = host {
                config.service.host = host;
            }
            if let Some(port) = port {
                config.service.port = port;
            }

            init_tracing(&config.service.log_level);
            auth_service_lib::run_server(config).await?;
        }
        Commands::Migrate { action } => {
            let database = AuthServiceConfig::database_from_env()?;

            init_tracing("info");
            auth_service_lib::run_migrations(action.into(), &database).await?;
        }
    }

    Ok(())
}
