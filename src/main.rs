//! # Apartments API Main Entry Point
//!
//! Command line entry point: serve the API, apply migrations, or bootstrap
//! the first administrator account.

use anyhow::Context;
use clap::{Parser, Subcommand};

use apartments::{
    config::ConfigLoader,
    db,
    models::user::UserRole,
    repositories::{NewUser, UserRepository},
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Parser)]
#[command(name = "apartments", version, about = "Apartment management API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations and start the HTTP server (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("failed to load configuration")?;
    init_tracing(&config).context("failed to initialize tracing")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    db::run_migrations(&db).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, db).await,
        Commands::Migrate => Ok(()),
        Commands::CreateAdmin {
            full_name,
            email,
            phone,
        } => {
            let admin = UserRepository::new(&db)
                .create(NewUser {
                    full_name,
                    email,
                    phone,
                    role: UserRole::Admin,
                    apartment_id: None,
                })
                .await
                .context("failed to create administrator")?;
            println!("{}", admin.id);
            Ok(())
        }
    }
}
