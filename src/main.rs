//! DormHub server binary.
//!
//! `serve` runs the HTTP/WebSocket server and background jobs, `migrate`
//! applies database migrations, `create-admin` bootstraps the first admin
//! account.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use dormhub_api::{build_state, run_server};
use dormhub_core::config::AppConfig;
use dormhub_database::DatabasePool;
use dormhub_database::migration::run_migrations;

/// DormHub dormitory management server
#[derive(Debug, Parser)]
#[command(name = "dormhub-server", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to `config/default.toml` plus the
    /// environment overlay.
    #[arg(short, long)]
    config: Option<String>,

    /// Environment overlay, e.g. `production` loads `config/production.toml`
    #[arg(short, long, env = "DORMHUB_ENV", default_value = "development")]
    env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
enum Command {
    /// Start the server (default)
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Create an admin account
    CreateAdmin {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
        /// Login email
        #[arg(short, long)]
        email: Option<String>,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(&cli.env),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_logging(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(config).await,
        Command::CreateAdmin {
            name,
            email,
            password,
        } => create_admin(config, name, email, password).await,
    }
}

/// Initialize tracing/logging. `RUST_LOG` overrides the configured level.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting DormHub v{}", env!("CARGO_PKG_VERSION"));

    let pool = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        run_migrations(pool.pool()).await.context("Migration failed")?;
    }

    run_server(config, pool.into_pool())
        .await
        .context("Server error")?;
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;
    run_migrations(pool.pool()).await.context("Migration failed")?;
    pool.close().await;
    println!("All migrations applied successfully.");
    Ok(())
}

async fn create_admin(
    config: AppConfig,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let name = match name {
        Some(n) => n,
        None => dialoguer::Input::new()
            .with_prompt("Admin name")
            .interact_text()
            .context("Input error")?,
    };
    let email = match email {
        Some(e) => e,
        None => dialoguer::Input::new()
            .with_prompt("Admin email")
            .interact_text()
            .context("Input error")?,
    };
    let password = match password {
        Some(p) => p,
        None => dialoguer::Password::new()
            .with_prompt("Admin password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .context("Input error")?,
    };

    let pool = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;
    let state = build_state(config, pool.pool().clone())
        .await
        .context("Failed to initialize services")?;

    let admin = state
        .account_admin_service
        .create_admin(&name, &email, &password)
        .await
        .context("Failed to create admin")?;
    pool.close().await;

    println!("Admin '{}' created (id: {})", admin.name, admin.id);
    Ok(())
}
